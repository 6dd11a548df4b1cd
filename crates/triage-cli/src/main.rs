//! Triage CLI
//!
//! Command-line interface for the hybrid medical triage classifier.

use clap::{Parser, Subcommand};
use colored::Colorize;
use triage_core::{AgeBucket, FeedbackInput, Severity, Triage, TriageConfig};

/// Triage - hybrid medical emergency classifier CLI
#[derive(Parser)]
#[command(name = "triage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the hybrid medical triage classifier")]
#[command(long_about = "Classifies a free-text emergency description into a condition, severity, and response steps using a vector-retrieval, knowledge-graph, and LLM ensemble with a learning feedback loop.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit machine-readable JSON instead of colored text where supported
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a free-text emergency description
    Classify {
        /// The description of the emergency
        text: String,

        /// Age group of the patient: child, adult, or elderly
        #[arg(long)]
        age: Option<String>,

        /// Incident id to associate this prediction with
        #[arg(long)]
        incident_id: Option<i64>,
    },

    /// Record feedback on a prior prediction
    Feedback {
        /// Id returned by a previous `classify` call
        prediction_id: i64,

        /// Whether the prediction was correct
        #[arg(long)]
        correct: bool,

        /// The actual condition, if the prediction was wrong
        #[arg(long)]
        actual_condition: Option<String>,

        /// The actual severity, if the prediction was wrong
        #[arg(long)]
        actual_severity: Option<String>,

        /// Free-text notes from the reviewer
        #[arg(long)]
        notes: Option<String>,

        /// Identifier of the person recording this feedback
        #[arg(long, default_value = "cli")]
        verified_by: String,
    },

    /// Show accuracy statistics gathered from recorded feedback
    Stats,

    /// Find past verified cases similar to a description
    Similar {
        /// The description to match against
        text: String,

        /// Maximum number of matches to return
        #[arg(long, default_value = "5")]
        k: usize,
    },

    /// Promote verified-correct high-confidence predictions into the case corpus
    Promote {
        /// Minimum confidence a prediction must have had to be promoted
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Maximum number of predictions to promote in one run
        #[arg(long, default_value = "50")]
        max: usize,
    },

    /// Preview examples waiting to be promoted, without promoting them
    LearningQueue {
        /// Minimum confidence a prediction must have had to appear in the queue
        #[arg(long, default_value = "0.8")]
        min_confidence: f64,

        /// Maximum number of candidates to list
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let triage = Triage::open(TriageConfig::from_env())?;

    match cli.command {
        Commands::Classify { text, age, incident_id } => {
            run_classify(&triage, &text, age, incident_id, cli.json).await
        }
        Commands::Feedback { prediction_id, correct, actual_condition, actual_severity, notes, verified_by } => {
            run_feedback(&triage, prediction_id, correct, actual_condition, actual_severity, notes, verified_by)
        }
        Commands::Stats => run_stats(&triage, cli.json),
        Commands::Similar { text, k } => run_similar(&triage, &text, k, cli.json),
        Commands::Promote { min_confidence, max } => run_promote(&triage, min_confidence, max),
        Commands::LearningQueue { min_confidence, limit } => {
            run_learning_queue(&triage, min_confidence, limit, cli.json)
        }
    }
}

async fn run_classify(
    triage: &Triage,
    text: &str,
    age: Option<String>,
    incident_id: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let age_group = age.map(|a| a.parse::<AgeBucket>()).transpose().map_err(anyhow::Error::msg)?;
    let result = triage.classify(text, age_group, incident_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.verdict)?);
        return Ok(());
    }

    let verdict = &result.verdict;
    let severity_color = match verdict.severity {
        Severity::Critical => verdict.condition.red().bold(),
        Severity::Severe => verdict.condition.yellow().bold(),
        Severity::Moderate => verdict.condition.yellow(),
        Severity::Mild => verdict.condition.green(),
    };

    println!("{}", "=== Triage Verdict ===".cyan().bold());
    println!();
    println!("{}: {}", "Condition".white().bold(), severity_color);
    println!("{}: {}", "Severity".white().bold(), verdict.severity);
    println!("{}: {:.0}%", "Confidence".white().bold(), verdict.confidence * 100.0);
    println!("{}: {}", "Requires SOS".white().bold(), verdict.requires_sos);
    if let Some(sos) = &verdict.sos_number {
        println!("{}: {}", "SOS Number".white().bold(), sos.red().bold());
    }
    if let Some(id) = result.prediction_id {
        println!("{}: {}", "Prediction id".white().bold(), id);
    }

    if !verdict.steps.is_empty() {
        println!();
        println!("{}", "Steps".yellow().bold());
        for (i, step) in verdict.steps.iter().enumerate() {
            let marker = if step.critical { "!".red().bold() } else { format!("{}", i + 1).normal() };
            println!("  {} {} - {}", marker, step.title.white().bold(), step.detail);
        }
    }

    if !verdict.bring.is_empty() {
        println!();
        println!("{}: {}", "Bring".white().bold(), verdict.bring.join(", "));
    }

    if let Some(questions) = &verdict.clarifying_questions {
        println!();
        println!("{}", "Clarifying questions".magenta().bold());
        for q in questions {
            println!("  - {q}");
        }
    }

    if let Some(message) = &verdict.message {
        println!();
        println!("{}", message.dimmed());
    }

    println!();
    println!("{}: {}", "Sources".dimmed(), verdict.sources.join(", ").dimmed());

    Ok(())
}

fn run_feedback(
    triage: &Triage,
    prediction_id: i64,
    correct: bool,
    actual_condition: Option<String>,
    actual_severity: Option<String>,
    notes: Option<String>,
    verified_by: String,
) -> anyhow::Result<()> {
    let actual_severity = actual_severity.map(|s| s.parse::<Severity>()).transpose().map_err(anyhow::Error::msg)?;

    triage.record_feedback(
        prediction_id,
        &FeedbackInput { was_correct: correct, actual_condition, actual_severity, notes, verified_by },
    )?;

    println!("{}", "Feedback recorded.".green().bold());
    Ok(())
}

fn run_stats(triage: &Triage, json: bool) -> anyhow::Result<()> {
    let stats = triage.accuracy_stats()?;

    if json {
        println!(
            "{{\"overall_accuracy\":{},\"total_predictions\":{},\"predictions_with_feedback\":{},\"feedback_coverage\":{}}}",
            stats.overall_accuracy, stats.total_predictions, stats.predictions_with_feedback, stats.feedback_coverage
        );
        return Ok(());
    }

    println!("{}", "=== Triage Accuracy Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Total Predictions".white().bold(), stats.total_predictions);
    println!("{}: {}", "With Feedback".white().bold(), stats.predictions_with_feedback);
    println!("{}: {:.1}%", "Feedback Coverage".white().bold(), stats.feedback_coverage);
    println!("{}: {:.1}%", "Overall Accuracy".white().bold(), stats.overall_accuracy);
    println!(
        "{}: {} ({:+.1}%)",
        "Recent Trend".white().bold(),
        stats.recent_improvement.trend,
        stats.recent_improvement.improvement
    );

    if !stats.accuracy_by_type.is_empty() {
        println!();
        println!("{}", "Accuracy by condition".yellow().bold());
        let mut by_type: Vec<_> = stats.accuracy_by_type.iter().collect();
        by_type.sort_by(|a, b| a.0.cmp(b.0));
        for (condition, acc) in by_type {
            println!("  {}: {:.1}% ({}/{})", condition, acc.accuracy, acc.correct, acc.total);
        }
    }

    if !stats.common_mistakes.is_empty() {
        println!();
        println!("{}", "Common mistakes".red().bold());
        for mistake in &stats.common_mistakes {
            println!("  {} -> {} ({}x)", mistake.predicted, mistake.actual, mistake.count);
        }
    }

    Ok(())
}

fn run_similar(triage: &Triage, text: &str, k: usize, json: bool) -> anyhow::Result<()> {
    let cases = triage.similar_past_cases(text, k)?;

    if json {
        println!(
            "[{}]",
            cases
                .iter()
                .map(|c| format!(
                    "{{\"text\":{:?},\"condition\":{:?},\"severity\":{:?},\"similarity\":{}}}",
                    c.prediction_text, c.actual_condition, c.actual_severity.to_string(), c.similarity
                ))
                .collect::<Vec<_>>()
                .join(",")
        );
        return Ok(());
    }

    if cases.is_empty() {
        println!("{}", "No similar verified cases found.".dimmed());
        return Ok(());
    }

    println!("{}", "=== Similar Past Cases ===".cyan().bold());
    for case in cases {
        println!();
        println!("{}: {:.0}%", "Similarity".white().bold(), case.similarity * 100.0);
        println!("{}: {}", "Condition".white().bold(), case.actual_condition);
        println!("{}: {}", "Severity".white().bold(), case.actual_severity);
        println!("{}", case.prediction_text.dimmed());
    }

    Ok(())
}

fn run_promote(triage: &Triage, min_confidence: Option<f64>, max: usize) -> anyhow::Result<()> {
    let report = match min_confidence {
        Some(min_confidence) => triage.promote(min_confidence, max)?,
        None => triage.promote_default(max)?,
    };

    println!("{}", "=== Promotion Report ===".cyan().bold());
    println!("{}: {}", "Candidates".white().bold(), report.total_candidates);
    println!("{}: {}", "Promoted".green().bold(), report.promoted);
    println!("{}: {}", "Failed".red().bold(), report.failed);

    Ok(())
}

fn run_learning_queue(triage: &Triage, min_confidence: f64, limit: usize, json: bool) -> anyhow::Result<()> {
    let candidates = triage.learning_queue(min_confidence, limit)?;

    if json {
        println!(
            "[{}]",
            candidates
                .iter()
                .map(|c| format!(
                    "{{\"prediction_id\":{},\"text\":{:?},\"condition\":{:?},\"severity\":{:?},\"confidence\":{}}}",
                    c.prediction_id, c.user_text, c.predicted_condition, c.predicted_severity.to_string(), c.confidence
                ))
                .collect::<Vec<_>>()
                .join(",")
        );
        return Ok(());
    }

    if candidates.is_empty() {
        println!("{}", "No examples currently waiting for promotion.".dimmed());
        return Ok(());
    }

    println!("{}", "=== Learning Queue ===".cyan().bold());
    for candidate in candidates {
        println!();
        println!("{}: {}", "Prediction id".white().bold(), candidate.prediction_id);
        println!("{}: {}", "Condition".white().bold(), candidate.predicted_condition);
        println!("{}: {}", "Severity".white().bold(), candidate.predicted_severity);
        println!("{}: {:.0}%", "Confidence".white().bold(), candidate.confidence * 100.0);
        println!("{}", candidate.user_text.dimmed());
    }

    Ok(())
}
