//! Learning Subsystem (C7, spec.md §4.7).
//!
//! Ported from `ai_learning.py::AILearningEngine`: records predictions and
//! feedback, promotes verified-correct high-confidence predictions into the
//! case corpus, and reports accuracy statistics.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::corpus::{CaseCorpus, CaseMetadata, CaseSource};
use crate::error::LearningError;
use crate::storage;
use crate::types::{Severity, Source};

/// A recorded prediction, per spec.md §3 "Prediction record".
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub incident_id: Option<i64>,
    pub user_text: String,
    pub predicted_condition: String,
    pub predicted_severity: Severity,
    pub confidence: f64,
    pub sources_used: Vec<Source>,
}

/// Feedback attached to a prior prediction (spec.md §3 "Feedback record").
#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub was_correct: bool,
    pub actual_condition: Option<String>,
    pub actual_severity: Option<Severity>,
    pub notes: Option<String>,
    pub verified_by: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromoteReport {
    pub promoted: usize,
    pub failed: usize,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AccuracyStats {
    pub overall_accuracy: f64,
    pub total_predictions: i64,
    pub predictions_with_feedback: i64,
    pub correct_predictions: i64,
    pub accuracy_by_type: HashMap<String, TypeAccuracy>,
    pub common_mistakes: Vec<Mistake>,
    pub recent_improvement: RecentImprovement,
    pub feedback_coverage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TypeAccuracy {
    pub total: i64,
    pub correct: i64,
    pub accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct Mistake {
    pub predicted: String,
    pub actual: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RecentImprovement {
    pub last_7_days_accuracy: f64,
    pub previous_7_days_accuracy: f64,
    pub improvement: f64,
    pub trend: &'static str,
}

/// One row of `promote`'s candidate set, surfaced read-only for preview.
#[derive(Debug, Clone)]
pub struct LearningCandidate {
    pub prediction_id: i64,
    pub user_text: String,
    pub predicted_condition: String,
    pub predicted_severity: Severity,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct SimilarCase {
    pub prediction_text: String,
    pub actual_condition: String,
    pub actual_severity: Severity,
    pub similarity: f64,
}

/// Records predictions/feedback and promotes verified cases into the corpus.
pub struct LearningSubsystem {
    writer: Mutex<rusqlite::Connection>,
    reader: Mutex<rusqlite::Connection>,
    /// Serializes `promote` against itself, per spec.md §5.
    promote_lock: Mutex<()>,
}

impl LearningSubsystem {
    pub fn open(db_path: &Path) -> Result<Self, LearningError> {
        let (writer, reader) = storage::open_pair(db_path)?;
        Ok(Self { writer: Mutex::new(writer), reader: Mutex::new(reader), promote_lock: Mutex::new(()) })
    }

    pub fn record_prediction(&self, record: &PredictionRecord) -> Result<i64, LearningError> {
        let sources_json = serde_json::to_string(
            &record.sources_used.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string());

        let writer = self.writer.lock().unwrap();
        writer.execute(
            "INSERT INTO predictions (incident_id, user_text, predicted_condition, predicted_severity, confidence, sources_used, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.incident_id,
                record.user_text,
                record.predicted_condition,
                record.predicted_severity.to_string(),
                record.confidence,
                sources_json,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(writer.last_insert_rowid())
    }

    /// Record feedback for a prior prediction. Enforces spec.md I3 (at most
    /// one feedback row per prediction) and writes a retraining entry only
    /// when the prediction was wrong and a corrected condition is supplied.
    pub fn record_feedback(
        &self,
        prediction_id: i64,
        feedback: &FeedbackInput,
    ) -> Result<(), LearningError> {
        let writer = self.writer.lock().unwrap();

        let prediction: Option<(String, String, String, Option<i64>)> = writer
            .query_row(
                "SELECT user_text, predicted_condition, predicted_severity, incident_id FROM predictions WHERE id = ?1",
                [prediction_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .ok();
        let Some((user_text, predicted_condition, predicted_severity, incident_id)) = prediction else {
            return Err(LearningError::PredictionNotFound(prediction_id));
        };

        let existing: Option<i64> = writer
            .query_row(
                "SELECT id FROM feedback WHERE prediction_id = ?1",
                [prediction_id],
                |row| row.get(0),
            )
            .ok();
        if existing.is_some() {
            return Err(LearningError::FeedbackAlreadyRecorded(prediction_id));
        }

        let actual_condition = feedback.actual_condition.clone().unwrap_or_else(|| predicted_condition.clone());
        let actual_severity = feedback
            .actual_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| predicted_severity.clone());

        writer.execute(
            "INSERT INTO feedback (prediction_id, was_correct, actual_condition, actual_severity, notes, verified_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                prediction_id,
                feedback.was_correct,
                actual_condition,
                actual_severity,
                feedback.notes,
                feedback.verified_by,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        if !feedback.was_correct {
            if let Some(correct_condition) = &feedback.actual_condition {
                let correct_severity = feedback
                    .actual_severity
                    .map(|s| s.to_string())
                    .unwrap_or(predicted_severity);
                writer.execute(
                    "INSERT INTO retraining (prediction_id, user_text, correct_condition, correct_severity, origin_incident, added_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        prediction_id,
                        user_text,
                        correct_condition,
                        correct_severity,
                        incident_id,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
            }
        }

        Ok(())
    }

    /// Promote up to `max` verified-correct predictions at or above
    /// `min_confidence` into `corpus`. Ported from
    /// `ai_learning.py::get_learning_candidates` + `retrain_vector_db`: the
    /// candidate set is `predictions` joined to `feedback` directly (the
    /// `retraining` rows written by [`Self::record_feedback`] hold *corrected*
    /// examples from wrong predictions and are a separate audit trail, not
    /// this routine's input — see SPEC_FULL.md §2 [C7]). Idempotent: each
    /// promoted prediction gets its own consumed `retraining` marker row so a
    /// second call excludes it.
    pub fn promote(
        &self,
        corpus: &CaseCorpus,
        min_confidence: f64,
        max: usize,
    ) -> Result<PromoteReport, LearningError> {
        let _guard = self.promote_lock.lock().unwrap();

        let writer = self.writer.lock().unwrap();
        let mut stmt = writer.prepare(
            "SELECT p.id, p.user_text, p.predicted_condition, p.predicted_severity, p.confidence, p.incident_id
             FROM predictions p
             JOIN feedback f ON f.prediction_id = p.id
             WHERE f.was_correct = 1
               AND p.confidence >= ?1
               AND p.id NOT IN (SELECT prediction_id FROM retraining WHERE consumed_at IS NOT NULL)
             ORDER BY p.created_at ASC
             LIMIT ?2",
        )?;
        let candidates: Vec<(i64, String, String, String, f64, Option<i64>)> = stmt
            .query_map(rusqlite::params![min_confidence, max as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        let mut report = PromoteReport { total_candidates: candidates.len(), ..Default::default() };

        for (prediction_id, text, condition, severity_str, confidence, incident_id) in candidates {
            let severity = severity_str.parse().unwrap_or(Severity::Moderate);
            let metadata = CaseMetadata {
                source: CaseSource::Promoted,
                verified: true,
                origin_confidence: Some(confidence),
            };

            match corpus.add(&text, &condition, severity, metadata) {
                Ok(_case_id) => {
                    let now = chrono::Utc::now().to_rfc3339();
                    writer.execute(
                        "INSERT INTO retraining (prediction_id, user_text, correct_condition, correct_severity, origin_incident, added_at, consumed_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                        rusqlite::params![prediction_id, text, condition, severity_str, incident_id, now],
                    )?;
                    report.promoted += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to promote prediction {prediction_id}: {e}");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Preview `promote`'s candidate set without consuming it. Ported from
    /// `ai_learning.py::get_learning_candidates` via `routes/learning.py::
    /// get_learning_queue` — same selection query as [`Self::promote`], read
    /// against `reader` rather than `writer`, and no `retraining` marker row
    /// is written.
    pub fn learning_queue(
        &self,
        min_confidence: f64,
        limit: usize,
    ) -> Result<Vec<LearningCandidate>, LearningError> {
        let reader = self.reader.lock().unwrap();
        let mut stmt = reader.prepare(
            "SELECT p.id, p.user_text, p.predicted_condition, p.predicted_severity, p.confidence
             FROM predictions p
             JOIN feedback f ON f.prediction_id = p.id
             WHERE f.was_correct = 1
               AND p.confidence >= ?1
               AND p.id NOT IN (SELECT prediction_id FROM retraining WHERE consumed_at IS NOT NULL)
             ORDER BY p.created_at ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![min_confidence, limit as i64], |row| {
                let severity_str: String = row.get(3)?;
                Ok(LearningCandidate {
                    prediction_id: row.get(0)?,
                    user_text: row.get(1)?,
                    predicted_condition: row.get(2)?,
                    predicted_severity: severity_str.parse().unwrap_or(Severity::Moderate),
                    confidence: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn accuracy_stats(&self) -> Result<AccuracyStats, LearningError> {
        let reader = self.reader.lock().unwrap();

        let total_predictions: i64 =
            reader.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        let predictions_with_feedback: i64 =
            reader.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))?;
        let correct_predictions: i64 = reader.query_row(
            "SELECT COUNT(*) FROM feedback WHERE was_correct = 1",
            [],
            |row| row.get(0),
        )?;

        let overall_accuracy = if predictions_with_feedback > 0 {
            round3(correct_predictions as f64 / predictions_with_feedback as f64 * 100.0)
        } else {
            0.0
        };

        let mut accuracy_by_type = HashMap::new();
        {
            let mut stmt = reader.prepare(
                "SELECT p.predicted_condition, COUNT(*), SUM(f.was_correct)
                 FROM feedback f JOIN predictions p ON p.id = f.prediction_id
                 GROUP BY p.predicted_condition",
            )?;
            let rows = stmt.query_map([], |row| {
                let condition: String = row.get(0)?;
                let total: i64 = row.get(1)?;
                let correct: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);
                Ok((condition, total, correct))
            })?;
            for row in rows {
                let (condition, total, correct) = row?;
                let accuracy = if total > 0 { round3(correct as f64 / total as f64 * 100.0) } else { 0.0 };
                accuracy_by_type.insert(condition, TypeAccuracy { total, correct, accuracy });
            }
        }

        let mut common_mistakes = Vec::new();
        {
            let mut stmt = reader.prepare(
                "SELECT p.predicted_condition, f.actual_condition, COUNT(*) as cnt
                 FROM feedback f JOIN predictions p ON p.id = f.prediction_id
                 WHERE f.was_correct = 0
                 GROUP BY p.predicted_condition, f.actual_condition
                 ORDER BY cnt DESC
                 LIMIT 10",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Mistake { predicted: row.get(0)?, actual: row.get(1)?, count: row.get(2)? })
            })?;
            for row in rows {
                common_mistakes.push(row?);
            }
        }

        let recent_improvement = recent_improvement(&reader)?;

        let feedback_coverage = if total_predictions > 0 {
            round3(predictions_with_feedback as f64 / total_predictions as f64 * 100.0)
        } else {
            0.0
        };

        Ok(AccuracyStats {
            overall_accuracy,
            total_predictions,
            predictions_with_feedback,
            correct_predictions,
            accuracy_by_type,
            common_mistakes,
            recent_improvement,
            feedback_coverage,
        })
    }

    /// Rank verified feedback by keyword overlap with `text`, matching
    /// `ai_learning.py::get_similar_past_cases`'s `> 0.3` floor.
    pub fn similar_past_cases(&self, text: &str, k: usize) -> Result<Vec<SimilarCase>, LearningError> {
        let keywords: Vec<String> = text
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let reader = self.reader.lock().unwrap();
        let mut stmt = reader.prepare(
            "SELECT p.user_text, f.actual_condition, f.actual_severity
             FROM feedback f JOIN predictions p ON p.id = f.prediction_id
             WHERE f.was_correct = 1",
        )?;
        let rows = stmt.query_map([], |row| {
            let prediction_text: String = row.get(0)?;
            let actual_condition: String = row.get(1)?;
            let actual_severity: String = row.get(2)?;
            Ok((prediction_text, actual_condition, actual_severity))
        })?;

        let mut ranked = Vec::new();
        for row in rows {
            let (prediction_text, actual_condition, actual_severity_str) = row?;
            let lower = prediction_text.to_lowercase();
            let matches = keywords.iter().filter(|kw| lower.contains(kw.as_str())).count();
            let similarity = matches as f64 / keywords.len() as f64;
            if similarity > 0.3 {
                ranked.push(SimilarCase {
                    prediction_text,
                    actual_condition,
                    actual_severity: actual_severity_str.parse().unwrap_or(Severity::Moderate),
                    similarity: round3(similarity),
                });
            }
        }

        ranked.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        Ok(ranked)
    }
}

fn recent_improvement(reader: &rusqlite::Connection) -> Result<RecentImprovement, LearningError> {
    let now = chrono::Utc::now();
    let seven_days_ago = (now - chrono::Duration::days(7)).to_rfc3339();
    let fourteen_days_ago = (now - chrono::Duration::days(14)).to_rfc3339();

    let accuracy_since = |since: &str, until: &str| -> rusqlite::Result<f64> {
        let total: i64 = reader.query_row(
            "SELECT COUNT(*) FROM feedback WHERE created_at >= ?1 AND created_at < ?2",
            rusqlite::params![since, until],
            |row| row.get(0),
        )?;
        if total == 0 {
            return Ok(0.0);
        }
        let correct: i64 = reader.query_row(
            "SELECT COUNT(*) FROM feedback WHERE created_at >= ?1 AND created_at < ?2 AND was_correct = 1",
            rusqlite::params![since, until],
            |row| row.get(0),
        )?;
        Ok(round3(correct as f64 / total as f64 * 100.0))
    };

    let now_str = now.to_rfc3339();
    let last_7_days_accuracy = accuracy_since(&seven_days_ago, &now_str)?;
    let previous_7_days_accuracy = accuracy_since(&fourteen_days_ago, &seven_days_ago)?;
    let improvement = round3(last_7_days_accuracy - previous_7_days_accuracy);

    let trend = if improvement > 1.0 {
        "improving"
    } else if improvement < -1.0 {
        "declining"
    } else {
        "stable"
    };

    Ok(RecentImprovement { last_7_days_accuracy, previous_7_days_accuracy, improvement, trend })
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("learning.sqlite3");
        (dir, db)
    }

    #[test]
    fn record_feedback_rejects_duplicate() {
        let (_dir, db) = temp_db();
        let learning = LearningSubsystem::open(&db).unwrap();
        let prediction_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "chest pain and sweating".to_string(),
                predicted_condition: "chest_pain_cardiac".to_string(),
                predicted_severity: Severity::Critical,
                confidence: 0.9,
                sources_used: vec![Source::VectorDb],
            })
            .unwrap();

        let feedback = FeedbackInput {
            was_correct: true,
            actual_condition: None,
            actual_severity: None,
            notes: None,
            verified_by: "reviewer".to_string(),
        };
        learning.record_feedback(prediction_id, &feedback).unwrap();

        let result = learning.record_feedback(prediction_id, &feedback);
        assert!(matches!(result, Err(LearningError::FeedbackAlreadyRecorded(_))));
    }

    #[test]
    fn record_feedback_unknown_prediction_errors() {
        let (_dir, db) = temp_db();
        let learning = LearningSubsystem::open(&db).unwrap();
        let feedback = FeedbackInput {
            was_correct: false,
            actual_condition: Some("stroke".to_string()),
            actual_severity: None,
            notes: None,
            verified_by: "reviewer".to_string(),
        };
        let result = learning.record_feedback(999, &feedback);
        assert!(matches!(result, Err(LearningError::PredictionNotFound(999))));
    }

    #[test]
    fn incorrect_feedback_with_correction_writes_retraining_entry() {
        let (_dir, db) = temp_db();
        let learning = LearningSubsystem::open(&db).unwrap();
        let prediction_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "face drooping and slurred speech".to_string(),
                predicted_condition: "fainting".to_string(),
                predicted_severity: Severity::Moderate,
                confidence: 0.4,
                sources_used: vec![Source::KnowledgeGraph],
            })
            .unwrap();

        learning
            .record_feedback(
                prediction_id,
                &FeedbackInput {
                    was_correct: false,
                    actual_condition: Some("stroke".to_string()),
                    actual_severity: Some(Severity::Critical),
                    notes: Some("misclassified".to_string()),
                    verified_by: "reviewer".to_string(),
                },
            )
            .unwrap();

        let writer = learning.writer.lock().unwrap();
        let count: i64 = writer
            .query_row("SELECT COUNT(*) FROM retraining WHERE prediction_id = ?1", [prediction_id], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn learning_queue_excludes_unverified_and_low_confidence() {
        let (_dir, db) = temp_db();
        let learning = LearningSubsystem::open(&db).unwrap();

        let correct_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "crushing chest pain radiating to the arm".to_string(),
                predicted_condition: "chest_pain_cardiac".to_string(),
                predicted_severity: Severity::Critical,
                confidence: 0.92,
                sources_used: vec![Source::VectorDb, Source::KnowledgeGraph],
            })
            .unwrap();
        learning
            .record_feedback(
                correct_id,
                &FeedbackInput {
                    was_correct: true,
                    actual_condition: None,
                    actual_severity: None,
                    notes: None,
                    verified_by: "emt".to_string(),
                },
            )
            .unwrap();

        let low_confidence_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "they feel kinda off".to_string(),
                predicted_condition: "fainting".to_string(),
                predicted_severity: Severity::Moderate,
                confidence: 0.4,
                sources_used: vec![Source::KnowledgeGraph],
            })
            .unwrap();
        learning
            .record_feedback(
                low_confidence_id,
                &FeedbackInput {
                    was_correct: true,
                    actual_condition: None,
                    actual_severity: None,
                    notes: None,
                    verified_by: "emt".to_string(),
                },
            )
            .unwrap();

        let unverified_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "possible stroke symptoms".to_string(),
                predicted_condition: "stroke".to_string(),
                predicted_severity: Severity::Critical,
                confidence: 0.9,
                sources_used: vec![Source::VectorDb],
            })
            .unwrap();
        let _ = unverified_id;

        let queue = learning.learning_queue(0.8, 10).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].prediction_id, correct_id);
        assert_eq!(queue[0].predicted_condition, "chest_pain_cardiac");
    }

    #[test]
    #[ignore = "requires fastembed model download"]
    fn promote_is_idempotent_and_skips_unverified() {
        let (_dir, db) = temp_db();
        let index_path = _dir.path().join("cases.usearch");
        let learning = LearningSubsystem::open(&db).unwrap();
        let corpus = CaseCorpus::open(&db, &index_path).unwrap();

        let correct_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "my grandfather collapsed and isn't breathing".to_string(),
                predicted_condition: "cardiac_arrest".to_string(),
                predicted_severity: Severity::Critical,
                confidence: 0.95,
                sources_used: vec![Source::VectorDb, Source::KnowledgeGraph],
            })
            .unwrap();
        learning
            .record_feedback(
                correct_id,
                &FeedbackInput {
                    was_correct: true,
                    actual_condition: None,
                    actual_severity: None,
                    notes: None,
                    verified_by: "emt".to_string(),
                },
            )
            .unwrap();

        let low_confidence_id = learning
            .record_prediction(&PredictionRecord {
                incident_id: None,
                user_text: "they feel kinda off".to_string(),
                predicted_condition: "fainting".to_string(),
                predicted_severity: Severity::Moderate,
                confidence: 0.4,
                sources_used: vec![Source::KnowledgeGraph],
            })
            .unwrap();
        learning
            .record_feedback(
                low_confidence_id,
                &FeedbackInput {
                    was_correct: true,
                    actual_condition: None,
                    actual_severity: None,
                    notes: None,
                    verified_by: "emt".to_string(),
                },
            )
            .unwrap();

        let first = learning.promote(&corpus, 0.8, 10).unwrap();
        assert_eq!(first.promoted, 1);
        assert_eq!(first.total_candidates, 1);

        let second = learning.promote(&corpus, 0.8, 10).unwrap();
        assert_eq!(second.promoted, 0);
        assert_eq!(second.total_candidates, 0);
    }
}
