//! Integration test: build a pack, persist it, load it through a session
//! and answer questions.

use std::path::PathBuf;

use vitae_core::{Section, VitaeConfig};
use vitae_query::{answer, rank, FileSource, NoMatchReason, Outcome, PackSession, QueryOptions};

const RESUME: &str = include_str!("../../../tests/fixtures/resume.txt");

async fn session_for(text: &str) -> (tempfile::TempDir, PackSession) {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("pack.json");
    vitae_index::build_pack(text, &VitaeConfig::default())
        .save(&path)
        .unwrap();

    let session = PackSession::new();
    session.load(&FileSource(path)).await.unwrap();
    (dir, session)
}

#[tokio::test]
async fn degree_question_hits_education() {
    let (_dir, session) = session_for(RESUME).await;
    let outcome = session.ask("computer science degree", &QueryOptions::default());
    let answer = outcome.answer().expect("should answer");
    assert_eq!(answer.matches[0].section, Some(Section::new("education")));
    assert!(answer.assembled.contains("Computer Science"));
}

#[tokio::test]
async fn scores_are_descending_and_bounded() {
    let (_dir, session) = session_for(RESUME).await;
    let options = QueryOptions {
        top_k: 5,
        ..QueryOptions::default()
    };
    let outcome = session.ask("rust distributed scheduler kafka", &options);
    let matches = &outcome.answer().expect("should answer").matches;
    assert!(matches.len() <= 5);
    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for m in matches {
        assert!(m.score > options.min_score && m.score <= 1.0 + 1e-9);
    }
}

#[tokio::test]
async fn unknown_terms_are_no_match() {
    let (_dir, session) = session_for(RESUME).await;
    assert_eq!(
        session.ask("xyzzy quux", &QueryOptions::default()),
        Outcome::NoMatch {
            reason: NoMatchReason::NoKnownTerms
        }
    );
}

#[tokio::test]
async fn empty_document_pack_never_answers() {
    let (_dir, session) = session_for("  \n ").await;
    for question in ["rust", "", "distributed systems experience"] {
        assert!(matches!(
            session.ask(question, &QueryOptions::default()),
            Outcome::NoMatch { .. }
        ));
    }
}

#[tokio::test]
async fn lowering_threshold_only_adds_matches() {
    let (_dir, session) = session_for(RESUME).await;
    let pack = session.pack().unwrap();
    let question = "python data pipelines postgres";

    let ranked_ids: Vec<usize> = rank(question, &pack).iter().map(|s| s.chunk_id).collect();
    let ids = |min_score: f64| -> Vec<usize> {
        let options = QueryOptions {
            top_k: usize::MAX,
            min_score,
            dedup_threshold: None,
        };
        match answer(question, &pack, &options) {
            Outcome::Answered(a) => a.matches.iter().map(|m| m.chunk_id).collect(),
            _ => Vec::new(),
        }
    };

    let strict = ids(0.2);
    let lenient = ids(0.0);
    assert!(!strict.is_empty());
    assert!(lenient.len() >= strict.len());
    assert_eq!(&lenient[..strict.len()], strict.as_slice());
    assert_eq!(&ranked_ids[..lenient.len()], lenient.as_slice());
}

#[test]
fn ranking_example_from_two_chunks() {
    use vitae_index::chunker::Passage;

    let passages = [
        Passage {
            text: "Worked on distributed systems at Acme".into(),
            section: None,
        },
        Passage {
            text: "Studied computer science at State University".into(),
            section: None,
        },
    ];
    let pack = vitae_index::pack_passages(&passages, &VitaeConfig::default());
    let loaded = vitae_query::LoadedPack::new(pack).unwrap();
    let ranked = rank("distributed systems experience", &loaded);
    assert_eq!(ranked[0].chunk_id, 0);
    assert!(ranked[0].score > ranked[1].score);
}
