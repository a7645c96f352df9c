//! End-to-end pipeline runs against in-memory backends and a scripted
//! generative client.

use std::sync::Arc;

use capbot_agents::MockGenerativeClient;
use capbot_embeddings::HashEmbedder;
use capbot_index::{InMemoryVectorStore, SimilarityIndex};
use capbot_pipeline::{FailureCause, Orchestrator, PipelineOutcome, SubmitOptions, SubmitRequest};
use capbot_store::{InMemoryRecordStore, VersionStore};
use capbot_types::{
    CandidateDraft, MatchTier, PipelineConfig, SuggestionCriteria, TopicContent, VersionStatus,
};

struct Stack {
    store: Arc<VersionStore>,
    index: Arc<SimilarityIndex>,
    client: Arc<MockGenerativeClient>,
    orchestrator: Orchestrator,
}

fn stack() -> Stack {
    let store = Arc::new(VersionStore::new(Arc::new(InMemoryRecordStore::new())));
    let index = Arc::new(SimilarityIndex::new(
        Arc::new(HashEmbedder::new()),
        Arc::new(InMemoryVectorStore::new()),
    ));
    let client = Arc::new(MockGenerativeClient::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&index),
        Arc::clone(&client) as _,
        PipelineConfig::default(),
    );
    Stack {
        store,
        index,
        client,
        orchestrator,
    }
}

fn attendance_topic() -> TopicContent {
    TopicContent {
        en_title: "Smart Attendance System".to_string(),
        vn_title: "Hệ thống điểm danh thông minh".to_string(),
        abbreviation: "SAS".to_string(),
        problem: "Manual attendance taking is slow and error prone".to_string(),
        context: "University classrooms".to_string(),
        content: "Face recognition pipeline with a class roster backend".to_string(),
        description: "Face recognition attendance tracking for classrooms".to_string(),
        objectives: "Automate attendance capture with high accuracy".to_string(),
        category: "Artificial Intelligence".to_string(),
        team_size: 4,
        suggested_roles: TopicContent::default_roles(4),
    }
}

fn unrelated_topic() -> TopicContent {
    TopicContent {
        en_title: "Drone Crop Survey".to_string(),
        vn_title: "Khảo sát mùa vụ bằng drone".to_string(),
        abbreviation: "DCS".to_string(),
        problem: "Ground inspection misses early crop disease".to_string(),
        context: "Agricultural cooperatives".to_string(),
        content: "Aerial multispectral imaging and anomaly flagging".to_string(),
        description: "Drones photograph fields and flag unhealthy zones".to_string(),
        objectives: "Detect disease early from aerial imagery".to_string(),
        category: "Agriculture".to_string(),
        team_size: 4,
        suggested_roles: TopicContent::default_roles(4),
    }
}

fn revision_response() -> String {
    r#"{
        "en_title": "Exam Hall Monitoring Drones",
        "vn_title": "Giám sát phòng thi bằng drone",
        "abbreviation": "EHMD",
        "problem": "Invigilators cannot watch every corner of large exam halls",
        "context": "University examination centres",
        "content": "Autonomous indoor flight paths with incident flagging",
        "description": "Autonomous drones watch exam halls and flag irregular behaviour",
        "objectives": "Plan indoor flight routes and flag incidents reliably",
        "category": "Artificial Intelligence"
    }"#
    .to_string()
}

/// Commit a topic directly and return (entity_id, version_id).
async fn seed_committed(stack: &Stack, content: TopicContent) -> (String, String) {
    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(content)),
            SubmitOptions::default(),
        )
        .await;
    match outcome {
        PipelineOutcome::Committed {
            entity_id,
            version_id,
        } => (entity_id, version_id),
        other => panic!("seed commit failed: {:?}", other),
    }
}

#[tokio::test]
async fn test_unique_candidate_committed_and_indexed() {
    let stack = stack();
    let (entity_id, version_id) = seed_committed(&stack, attendance_topic()).await;

    let version = stack.store.get_version(&version_id).await.unwrap();
    assert_eq!(version.status, VersionStatus::Approved);
    assert!(stack.index.contains(&entity_id, &version_id).await.unwrap());
    assert!(stack.store.outbox().is_empty().await);
    // No generative call was needed for direct content.
    assert_eq!(stack.client.call_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_without_auto_revise_escalates() {
    let stack = stack();
    let (entity_id, _) = seed_committed(&stack, attendance_topic()).await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
            SubmitOptions {
                auto_revise: false,
                ..Default::default()
            },
        )
        .await;

    match outcome {
        PipelineOutcome::Escalated { report, .. } => {
            assert_eq!(report.tier, MatchTier::HardMatch);
            let best = report.best_match.unwrap();
            assert_eq!(best.entity_id, entity_id);
            assert!(best.score >= report.threshold);
        }
        other => panic!("expected Escalated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_revised_then_committed() {
    let stack = stack();
    seed_committed(&stack, attendance_topic()).await;
    stack.client.push_response(revision_response()).await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
            SubmitOptions::default(),
        )
        .await;

    let version_id = outcome
        .committed_version()
        .unwrap_or_else(|| panic!("expected Committed, got {:?}", outcome))
        .to_string();
    let version = stack.store.get_version(&version_id).await.unwrap();
    assert_eq!(version.content.en_title, "Exam Hall Monitoring Drones");
    // Team composition carries over from the flagged candidate.
    assert_eq!(version.content.team_size, 4);
    assert_eq!(stack.store.approved_versions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_partial_revision_uses_remaining_budget() {
    let stack = stack();
    seed_committed(&stack, attendance_topic()).await;

    // First revision stays in the attendance domain and is still
    // flagged; the second leaves it entirely. Both attempts of the
    // budget must be spent before escalating.
    stack
        .client
        .push_response(
            r#"{"en_title": "Automated Lecture Attendance Tracker",
                "vn_title": "VN Automated Lecture Attendance Tracker",
                "abbreviation": "ALAT",
                "problem": "Manual roll call wastes lecture time",
                "context": "Large lecture halls",
                "content": "QR code check-in flow",
                "description": "Attendance tracking using QR codes scanned by students for classrooms",
                "objectives": "Reduce time spent on roll call",
                "category": "General"}"#,
        )
        .await;
    stack.client.push_response(revision_response()).await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
            SubmitOptions::default(),
        )
        .await;

    let version_id = outcome
        .committed_version()
        .unwrap_or_else(|| panic!("expected Committed, got {:?}", outcome))
        .to_string();
    assert_eq!(stack.client.call_count().await, 2);
    let version = stack.store.get_version(&version_id).await.unwrap();
    assert_eq!(version.content.en_title, "Exam Hall Monitoring Drones");
}

#[tokio::test]
async fn test_revision_exhaustion_escalates() {
    let stack = stack();
    seed_committed(&stack, attendance_topic()).await;

    // Both attempts echo the duplicate back, so similarity never drops.
    let echo = serde_json::to_string(&attendance_topic()).unwrap();
    stack.client.push_response(echo.clone()).await;
    stack.client.push_response(echo).await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
            SubmitOptions::default(),
        )
        .await;

    match outcome {
        PipelineOutcome::Escalated { report, .. } => {
            assert_eq!(report.tier, MatchTier::HardMatch);
        }
        other => panic!("expected Escalated, got {:?}", other),
    }
    assert_eq!(stack.client.call_count().await, 2);
    // Nothing was committed.
    assert_eq!(stack.store.approved_versions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_suggestions_fall_back_and_commit() {
    let stack = stack();
    stack.client.push_response("not json at all").await;
    stack.client.push_response("{\"still\": \"wrong\"}").await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Criteria(SuggestionCriteria::default()),
            SubmitOptions::default(),
        )
        .await;

    let version_id = outcome
        .committed_version()
        .unwrap_or_else(|| panic!("expected Committed, got {:?}", outcome))
        .to_string();
    let version = stack.store.get_version(&version_id).await.unwrap();
    assert_eq!(version.content.abbreviation, "RORS");
    assert_eq!(stack.client.call_count().await, 2);
}

#[tokio::test]
async fn test_skip_duplicate_check_commits_duplicate() {
    let stack = stack();
    seed_committed(&stack, attendance_topic()).await;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
            SubmitOptions {
                check_duplicates: false,
                ..Default::default()
            },
        )
        .await;

    assert!(outcome.committed_version().is_some());
    assert_eq!(stack.store.approved_versions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_content_fails_with_cause() {
    let stack = stack();
    let mut bad = attendance_topic();
    bad.team_size = 3;

    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(bad)),
            SubmitOptions::default(),
        )
        .await;

    match outcome {
        PipelineOutcome::Failed { cause } => {
            assert!(matches!(cause, FailureCause::InvalidContent(_)));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resubmission_supersedes_existing_approval() {
    let stack = stack();
    let (entity_id, first_version) = seed_committed(&stack, attendance_topic()).await;

    // Resubmitting near-identical content for the same entity skips
    // comparison against its own history and replaces the approval.
    let mut updated = attendance_topic();
    updated.objectives = "Automate attendance capture and report absences".to_string();
    let outcome = stack
        .orchestrator
        .submit_for_review(
            SubmitRequest::Content(CandidateDraft::from_content(updated)),
            SubmitOptions {
                existing_entity: Some(entity_id.clone()),
                ..Default::default()
            },
        )
        .await;

    let new_version = outcome
        .committed_version()
        .unwrap_or_else(|| panic!("expected Committed, got {:?}", outcome))
        .to_string();
    assert_ne!(new_version, first_version);

    let old = stack.store.get_version(&first_version).await.unwrap();
    assert_eq!(old.status, VersionStatus::Superseded);

    let current = stack
        .store
        .get_current_approved(&entity_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.version_id, new_version);
    assert_eq!(stack.store.approved_versions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_independent_runs() {
    let stack = stack();
    let orchestrator = Arc::new(stack.orchestrator);

    let a = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .submit_for_review(
                    SubmitRequest::Content(CandidateDraft::from_content(attendance_topic())),
                    SubmitOptions::default(),
                )
                .await
        })
    };
    let b = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .submit_for_review(
                    SubmitRequest::Content(CandidateDraft::from_content(unrelated_topic())),
                    SubmitOptions::default(),
                )
                .await
        })
    };

    let (a, b) = tokio::join!(a, b);
    assert!(a.unwrap().committed_version().is_some());
    assert!(b.unwrap().committed_version().is_some());
    assert_eq!(stack.store.approved_versions().await.unwrap().len(), 2);
}
