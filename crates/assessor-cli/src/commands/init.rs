//! The `assessor init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("assessor.toml").exists() {
        println!("assessor.toml already exists, skipping.");
    } else {
        std::fs::write("assessor.toml", SAMPLE_CONFIG)?;
        println!("Created assessor.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: assessor validate --bank banks/example.toml");
    println!("  2. Run: assessor topics --bank banks/example.toml");
    println!("  3. Run: assessor take --mode practice");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# assessor configuration

max_questions = 20
confidence_scale = "five-point"
output_dir = "./assessor-results"

[source]
type = "bank"
path = "banks/example.toml"

# A remote question service instead:
# [source]
# type = "http"
# base_url = "https://questions.example.com/api"
# api_key = "${ASSESSOR_API_KEY}"

[durations]
practice = 1800
assessment = 600
adaptive = 900

[telemetry]
type = "jsonl"
path = "./assessor-results/events.jsonl"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A few questions of every kind to get started"

[[questions]]
id = "capital-france"
type = "multiple-choice"
prompt = "What is the capital of France?"
options = ["Berlin", "Paris", "Madrid"]
correct_answers = ["Paris"]
topic = "geography"
difficulty = "easy"
hints = ["It is on the Seine."]

[[questions]]
id = "primes"
type = "multiple-select"
prompt = "Which of these numbers are prime?"
options = ["two", "four", "seven", "nine"]
correct_answers = ["two", "seven"]
topic = "math"
difficulty = "medium"
points = 2

[[questions]]
id = "earth-flat"
type = "true-false"
prompt = "The Earth is flat."
correct_answers = [false]
topic = "science"
difficulty = "easy"

[[questions]]
id = "largest-ocean"
type = "short-answer"
prompt = "Name the largest ocean."
correct_answers = ["Pacific", "Pacific Ocean"]
topic = "geography"
difficulty = "medium"
time_limit_seconds = 60

[[questions]]
id = "boiling-point"
type = "slider"
prompt = "At what temperature (Celsius) does water boil at sea level?"
min = 0
max = 200
correct_answers = [100]
topic = "science"
difficulty = "medium"

[[questions]]
id = "sum-blanks"
type = "fill-blank"
prompt = "2 + 2 = ___ and 3 + 3 = ___"
blanks = ["first sum", "second sum"]
correct_answers = ["4", "6"]
topic = "math"
difficulty = "easy"

[[questions]]
id = "why-study"
type = "essay"
prompt = "Why do you want to learn this material?"
topic = "reflection"
difficulty = "hard"
"#;
