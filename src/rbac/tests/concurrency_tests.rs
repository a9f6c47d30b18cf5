//! Concurrent role resolution tests
//!
//! Many resolvers racing on one authorizer, many authorizers sharing one
//! index, and queries issued while resolution is still running.

use cretoai_rbac::{Authorizer, Index, RoleChain};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinSet;

fn tenant_index(tenants: usize) -> Index {
    let chains: Vec<RoleChain> = (0..tenants)
        .map(|t| {
            RoleChain::new(format!("tenant{}", t))
                .add("Viewer", &["read"])
                .add("Editor", &["write"])
                .add("Owner", &["delete"])
        })
        .collect();

    Index::new(chains).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_lost_updates_under_contention() {
    let index = tenant_index(50);
    let authorizer = Authorizer::new(&index);

    for t in 0..50 {
        authorizer.add_async(move || async move {
            tokio::time::sleep(Duration::from_millis((t % 5) as u64)).await;
            Ok::<_, String>(vec![format!("tenant{}.Viewer", t), format!("tenant{}.Editor", t)])
        });
    }

    assert!(authorizer.err().await.is_ok());

    let held: HashSet<String> = authorizer.roles().await.into_iter().collect();
    assert_eq!(held.len(), 100);
    assert!(held.contains("tenant49.Editor"));
    assert!(!held.contains("tenant0.Owner"));
    assert!(!authorizer.has_permission("delete").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_see_complete_state() {
    let index = tenant_index(1);
    let authorizer = Authorizer::new(&index);

    authorizer.add_async(|| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(vec!["tenant0.Owner".to_string()])
    });

    let mut queries = JoinSet::new();
    for _ in 0..16 {
        let authorizer = authorizer.clone();
        queries.spawn(async move { authorizer.has_permission("delete").await });
    }

    while let Some(answer) = queries.join_next().await {
        assert!(answer.unwrap(), "query answered before resolution finished");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_authorizers_share_index() {
    let index = tenant_index(8);
    let mut tasks = JoinSet::new();

    for t in 0..8 {
        let index = index.clone();
        tasks.spawn(async move {
            let authorizer = index.authorizer(Vec::<String>::new());
            authorizer.add_async(move || async move {
                Ok::<_, String>(vec![format!("tenant{}.Viewer", t)])
            });
            if t % 2 == 0 {
                authorizer.add_async(|| async { Err::<Vec<String>, _>("directory offline") });
            }

            let failed = authorizer.err().await.is_err();
            let role = format!("tenant{}.Viewer", t);
            (t, failed, authorizer.has_role(&role).await, authorizer.roles().await.len())
        });
    }

    while let Some(result) = tasks.join_next().await {
        let (t, failed, has_role, held) = result.unwrap();
        assert_eq!(failed, t % 2 == 0);
        assert!(has_role);
        assert_eq!(held, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolvers_scheduled_from_other_tasks() {
    let index = tenant_index(20);
    let authorizer = Authorizer::new(&index);

    let mut schedulers = JoinSet::new();
    for t in 0..20 {
        let authorizer = authorizer.clone();
        schedulers.spawn(async move {
            authorizer.add_async(move || async move {
                Ok::<_, String>(vec![format!("tenant{}.Owner", t)])
            });
        });
    }
    while let Some(result) = schedulers.join_next().await {
        result.unwrap();
    }

    assert_eq!(authorizer.roles().await.len(), 20);
    assert!(authorizer.has_all_permissions(&["read", "write", "delete"]).await);
}
