//! The `assessor topics` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use assessor_core::model::Difficulty;
use assessor_core::parser::load_banks;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let bank = load_banks(&bank_path)?;

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Questions", "Easy", "Medium", "Hard", "Points"]);

    for topic in bank.topics() {
        let questions: Vec<_> = bank.questions.iter().filter(|q| q.topic == topic).collect();
        let count = |d: Difficulty| questions.iter().filter(|q| q.difficulty == d).count();
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(questions.len()),
            Cell::new(count(Difficulty::Easy)),
            Cell::new(count(Difficulty::Medium)),
            Cell::new(count(Difficulty::Hard)),
            Cell::new(questions.iter().map(|q| q.points).sum::<u32>()),
        ]);
    }

    println!("{} ({} questions)", bank.name, bank.questions.len());
    println!("{table}");

    Ok(())
}
