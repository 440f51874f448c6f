//! Concurrent article writers under one issue must not lose aggregate updates.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use common::{article, issue, seed_sources, test_service};
use prism_core::entities::CoverageSpectrum;

const WRITERS: u32 = 24;

const SOURCES: [&str; 3] = ["src-left", "src-center", "src-right"];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_are_all_counted() {
    let svc = Arc::new(test_service().await);
    seed_sources(&svc).await;
    svc.insert_issue(&issue("I1", "Heatwave", "environment", "2025-07-01T00:00:00Z"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            let source = SOURCES[(i % 3) as usize];
            svc.insert_article(&article(&format!("A{i:03}"), "I1", source))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    }

    let spectrum = svc.get_issue("I1").await.unwrap().coverage_spectrum;
    let per_bucket = WRITERS / 3;
    assert_eq!(
        spectrum,
        CoverageSpectrum::from_counts(per_bucket, per_bucket, per_bucket)
    );
    assert_eq!(spectrum.total, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_and_deletes_converge() {
    let svc = Arc::new(test_service().await);
    seed_sources(&svc).await;
    svc.insert_issue(&issue("I1", "Rail fares", "economy", "2025-07-01T00:00:00Z"))
        .await
        .unwrap();
    for i in 0..WRITERS {
        svc.insert_article(&article(&format!("old{i:03}"), "I1", "src-left"))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.delete_article(&format!("old{i:03}")).await.unwrap();
            svc.insert_article(&article(&format!("new{i:03}"), "I1", "src-right"))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        svc.get_issue("I1").await.unwrap().coverage_spectrum,
        CoverageSpectrum::from_counts(0, 0, WRITERS)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_moves_of_one_article_leave_one_count() {
    let svc = Arc::new(test_service().await);
    seed_sources(&svc).await;
    for id in ["I1", "I2", "I3"] {
        svc.insert_issue(&issue(id, "Port strike", "economy", "2025-07-01T00:00:00Z"))
            .await
            .unwrap();
    }

    for round in 0..20 {
        let id = format!("A{round:03}");
        svc.insert_article(&article(&id, "I1", "src-center"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for target in ["I2", "I3"] {
            let (svc, id) = (Arc::clone(&svc), id.clone());
            handles.push(tokio::spawn(async move {
                svc.update_article(&article(&id, target, "src-center"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut total = 0;
        for issue_id in ["I1", "I2", "I3"] {
            let spectrum = svc.get_issue(issue_id).await.unwrap().coverage_spectrum;
            assert!(spectrum.is_consistent());
            total += spectrum.total;
        }
        assert_eq!(total, 1, "round {round}");

        svc.delete_article(&id).await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_a_move_leaves_no_count() {
    let svc = Arc::new(test_service().await);
    seed_sources(&svc).await;
    for id in ["I1", "I2"] {
        svc.insert_issue(&issue(id, "Drought", "environment", "2025-07-01T00:00:00Z"))
            .await
            .unwrap();
    }

    for round in 0..20 {
        let id = format!("D{round:03}");
        svc.insert_article(&article(&id, "I1", "src-left"))
            .await
            .unwrap();

        let mover = {
            let (svc, id) = (Arc::clone(&svc), id.clone());
            tokio::spawn(async move { svc.update_article(&article(&id, "I2", "src-left")).await })
        };
        let deleter = {
            let (svc, id) = (Arc::clone(&svc), id.clone());
            tokio::spawn(async move { svc.delete_article(&id).await })
        };
        // The move fails with NotFound when the delete wins.
        let _ = mover.await.unwrap();
        deleter.await.unwrap().unwrap();

        for issue_id in ["I1", "I2"] {
            let spectrum = svc.get_issue(issue_id).await.unwrap().coverage_spectrum;
            assert_eq!(spectrum, CoverageSpectrum::default(), "round {round} {issue_id}");
        }
    }
}
