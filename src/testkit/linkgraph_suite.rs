use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::{
    EdgeIterator, GraphError, LinkGraphRepository, LinkIterator,
};
use crate::domain::graph::{Edge, Link, partition_range};

const ITERATION_TIMEOUT: StdDuration = StdDuration::from_secs(10);

async fn insert_links(g: &dyn LinkGraphRepository, n: usize) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let mut link = Link::new(i.to_string());
        g.upsert_link(&mut link).await.unwrap();
        ids.push(link.id);
    }
    ids
}

async fn partitioned_link_iterator(
    g: &dyn LinkGraphRepository,
    partition: u32,
    num_partitions: u32,
    retrieved_before: DateTime<Utc>,
) -> Box<dyn LinkIterator> {
    let (from, to) = partition_range(partition, num_partitions).unwrap();
    g.links(from, to, retrieved_before).await.unwrap()
}

async fn partitioned_edge_iterator(
    g: &dyn LinkGraphRepository,
    partition: u32,
    num_partitions: u32,
    updated_before: DateTime<Utc>,
) -> Box<dyn EdgeIterator> {
    let (from, to) = partition_range(partition, num_partitions).unwrap();
    g.edges(from, to, updated_before).await.unwrap()
}

async fn drain_link_ids(mut it: Box<dyn LinkIterator>) -> Vec<Uuid> {
    let mut ids = Vec::new();
    while it.next().await {
        ids.push(it.link().id);
    }
    assert!(it.error().is_none(), "link iterator failed: {:?}", it.error());
    it.close().await.unwrap();
    ids
}

async fn drain_edges(mut it: Box<dyn EdgeIterator>) -> Vec<Edge> {
    let mut edges = Vec::new();
    while it.next().await {
        edges.push(it.edge().clone());
    }
    assert!(it.error().is_none(), "edge iterator failed: {:?}", it.error());
    it.close().await.unwrap();
    edges
}

fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids
}

async fn tick() {
    tokio::time::sleep(StdDuration::from_millis(5)).await;
}

pub async fn upsert_link(g: &dyn LinkGraphRepository) {
    let mut original = Link::retrieved("https://example.com", Utc::now() - Duration::hours(10));
    g.upsert_link(&mut original).await.unwrap();
    assert_ne!(original.id, Uuid::nil(), "expected an id to be assigned to the new link");

    // Newer timestamp for the same URL
    let accessed_at = Utc::now().trunc_subsecs(0);
    let mut existing = Link {
        id: original.id,
        url: "https://example.com".into(),
        retrieved_at: Some(accessed_at),
    };
    g.upsert_link(&mut existing).await.unwrap();
    assert_eq!(existing.id, original.id, "link id changed while upserting");

    let stored = g.find_link(existing.id).await.unwrap();
    assert_eq!(stored.retrieved_at, Some(accessed_at), "retrieval time was not updated");

    // Same URL, no id, older timestamp
    let mut same_url = Link::retrieved(existing.url.clone(), Utc::now() - Duration::hours(10));
    g.upsert_link(&mut same_url).await.unwrap();
    assert_eq!(same_url.id, existing.id, "link id changed while upserting");
    assert_eq!(same_url.retrieved_at, Some(accessed_at));

    let stored = g.find_link(existing.id).await.unwrap();
    assert_eq!(
        stored.retrieved_at,
        Some(accessed_at),
        "retrieval time was overwritten with an older value"
    );

    let mut other = Link::new("foo");
    g.upsert_link(&mut other).await.unwrap();
    assert_ne!(other.id, Uuid::nil());
    assert_ne!(other.id, existing.id);
}

pub async fn freshness_is_monotonic(g: &dyn LinkGraphRepository) {
    let base = Utc::now().trunc_subsecs(0);
    let mut id = None;
    for offset in [2, 0, 4, 1, 3] {
        let mut link = Link::retrieved("https://example.com/fresh", base + Duration::seconds(offset));
        g.upsert_link(&mut link).await.unwrap();
        assert_eq!(*id.get_or_insert(link.id), link.id);
    }

    let stored = g.find_link(id.unwrap()).await.unwrap();
    assert_eq!(stored.retrieved_at, Some(base + Duration::seconds(4)));

    // A link that was never fetched picks up the first real timestamp
    let mut pending = Link::new("https://example.com/pending");
    g.upsert_link(&mut pending).await.unwrap();
    assert_eq!(pending.retrieved_at, None);
    g.upsert_link(&mut Link::retrieved("https://example.com/pending", base))
        .await
        .unwrap();
    assert_eq!(g.find_link(pending.id).await.unwrap().retrieved_at, Some(base));
}

pub async fn find_link(g: &dyn LinkGraphRepository) {
    let mut link = Link::retrieved("https://example.com", Utc::now().trunc_subsecs(0));
    g.upsert_link(&mut link).await.unwrap();
    assert_ne!(link.id, Uuid::nil());

    let other = g.find_link(link.id).await.unwrap();
    assert_eq!(other, link, "lookup by id returned the wrong link");

    assert!(matches!(
        g.find_link(Uuid::nil()).await,
        Err(GraphError::NotFound)
    ));
}

pub async fn returned_links_are_copies(g: &dyn LinkGraphRepository) {
    let mut link = Link::new("https://example.com/copy");
    g.upsert_link(&mut link).await.unwrap();
    link.url = "https://example.com/mutated".into();

    let mut found = g.find_link(link.id).await.unwrap();
    assert_eq!(found.url, "https://example.com/copy");
    found.url.clear();

    let ids = drain_link_ids(partitioned_link_iterator(g, 0, 1, Utc::now()).await).await;
    assert_eq!(ids, vec![link.id]);
    assert_eq!(
        g.find_link(link.id).await.unwrap().url,
        "https://example.com/copy"
    );
}

pub async fn concurrent_link_iterators(g: Arc<dyn LinkGraphRepository>) {
    let num_iterators = 10;
    let num_links = 100;
    insert_links(g.as_ref(), num_links).await;

    let handles: Vec<_> = (0..num_iterators)
        .map(|id| {
            let g = g.clone();
            tokio::spawn(async move {
                let mut it = partitioned_link_iterator(g.as_ref(), 0, 1, Utc::now()).await;
                let mut seen = HashSet::new();
                while it.next().await {
                    let link_id = it.link().id;
                    assert!(seen.insert(link_id), "iterator {id} saw same link twice");
                }
                assert_eq!(seen.len(), num_links, "iterator {id}");
                assert!(it.error().is_none(), "iterator {id}");
                it.close().await.unwrap();
            })
        })
        .collect();

    tokio::time::timeout(ITERATION_TIMEOUT, async {
        for handle in handles {
            handle.await.unwrap();
        }
    })
    .await
    .expect("timed out waiting for iterators to complete");
}

pub async fn link_iterator_time_filter(g: &dyn LinkGraphRepository) {
    let mut ids = Vec::new();
    let mut insert_times = Vec::new();
    for i in 0..3 {
        let mut link = Link::retrieved(i.to_string(), Utc::now());
        g.upsert_link(&mut link).await.unwrap();
        ids.push(link.id);
        tick().await;
        insert_times.push(Utc::now());
        tick().await;
    }

    for (i, before) in insert_times.iter().enumerate() {
        let it = partitioned_link_iterator(g, 0, 1, *before).await;
        let got = sorted(drain_link_ids(it).await);
        assert_eq!(got, sorted(ids[..=i].to_vec()), "links retrieved before link {i}");
    }
}

async fn iterate_partitioned_links(g: &dyn LinkGraphRepository, num_partitions: u32) -> usize {
    let mut seen = HashSet::new();
    for partition in 0..num_partitions {
        let it = partitioned_link_iterator(g, partition, num_partitions, Utc::now()).await;
        for id in drain_link_ids(it).await {
            assert!(
                seen.insert(id),
                "iterator returned same link in different partitions"
            );
        }
    }
    seen.len()
}

pub async fn partitioned_link_iterators(g: &dyn LinkGraphRepository) {
    let num_links = 100;
    insert_links(g, num_links).await;

    // Odd and even partition counts to catch rounding bugs
    assert_eq!(iterate_partitioned_links(g, 10).await, num_links);
    assert_eq!(iterate_partitioned_links(g, 11).await, num_links);
}

pub async fn upsert_edge(g: &dyn LinkGraphRepository) {
    let ids = insert_links(g, 3).await;

    let mut edge = Edge::new(ids[0], ids[1]);
    g.upsert_edge(&mut edge).await.unwrap();
    assert_ne!(edge.id, Uuid::nil(), "expected an id to be assigned to the new edge");
    assert_ne!(edge.updated_at, DateTime::<Utc>::default(), "updated_at not set");

    tick().await;
    let mut other = Edge {
        id: edge.id,
        ..Edge::new(ids[0], ids[1])
    };
    g.upsert_edge(&mut other).await.unwrap();
    assert_eq!(other.id, edge.id, "edge id changed while upserting");
    assert!(other.updated_at > edge.updated_at, "updated_at not refreshed");

    // Re-observing without an id still resolves to the stored edge
    tick().await;
    let mut again = Edge::new(ids[0], ids[1]);
    g.upsert_edge(&mut again).await.unwrap();
    assert_eq!(again.id, edge.id);
    assert!(again.updated_at > other.updated_at);

    let edges = drain_edges(partitioned_edge_iterator(g, 0, 1, Utc::now()).await).await;
    assert_eq!(edges, vec![again]);
}

pub async fn unknown_endpoints_insert_nothing(g: &dyn LinkGraphRepository) {
    let ids = insert_links(g, 2).await;

    let mut bogus_dst = Edge::new(ids[0], Uuid::new_v4());
    assert!(matches!(
        g.upsert_edge(&mut bogus_dst).await,
        Err(GraphError::UnknownEdgeEndpoints)
    ));
    let mut bogus_src = Edge::new(Uuid::new_v4(), ids[1]);
    assert!(matches!(
        g.upsert_edge(&mut bogus_src).await,
        Err(GraphError::UnknownEdgeEndpoints)
    ));

    let edges = drain_edges(partitioned_edge_iterator(g, 0, 1, Utc::now()).await).await;
    assert!(edges.is_empty());
}

pub async fn concurrent_edge_iterators(g: Arc<dyn LinkGraphRepository>) {
    let num_iterators = 10;
    let num_edges = 100;
    let ids = insert_links(g.as_ref(), num_edges * 2).await;
    for dst in &ids[..num_edges] {
        g.upsert_edge(&mut Edge::new(ids[0], *dst)).await.unwrap();
    }

    let handles: Vec<_> = (0..num_iterators)
        .map(|id| {
            let g = g.clone();
            tokio::spawn(async move {
                let mut it = partitioned_edge_iterator(g.as_ref(), 0, 1, Utc::now()).await;
                let mut seen = HashSet::new();
                while it.next().await {
                    let edge_id = it.edge().id;
                    assert!(seen.insert(edge_id), "iterator {id} saw same edge twice");
                }
                assert_eq!(seen.len(), num_edges, "iterator {id}");
                assert!(it.error().is_none(), "iterator {id}");
                it.close().await.unwrap();
            })
        })
        .collect();

    tokio::time::timeout(ITERATION_TIMEOUT, async {
        for handle in handles {
            handle.await.unwrap();
        }
    })
    .await
    .expect("timed out waiting for iterators to complete");
}

pub async fn edge_iterator_time_filter(g: &dyn LinkGraphRepository) {
    let link_ids = insert_links(g, 3).await;

    let mut edge_ids = Vec::new();
    let mut insert_times = Vec::new();
    for dst in &link_ids {
        let mut edge = Edge::new(link_ids[0], *dst);
        g.upsert_edge(&mut edge).await.unwrap();
        edge_ids.push(edge.id);
        tick().await;
        insert_times.push(Utc::now());
        tick().await;
    }

    for (i, before) in insert_times.iter().enumerate() {
        let it = partitioned_edge_iterator(g, 0, 1, *before).await;
        let got = sorted(drain_edges(it).await.into_iter().map(|e| e.id).collect());
        assert_eq!(got, sorted(edge_ids[..=i].to_vec()), "edges updated before edge {i}");
    }
}

async fn iterate_partitioned_edges(g: &dyn LinkGraphRepository, num_partitions: u32) -> usize {
    let mut seen = HashSet::new();
    for partition in 0..num_partitions {
        // An edge belongs to the partition of its source link
        let links_in_partition: HashSet<Uuid> =
            drain_link_ids(partitioned_link_iterator(g, partition, num_partitions, Utc::now()).await)
                .await
                .into_iter()
                .collect();

        let it = partitioned_edge_iterator(g, partition, num_partitions, Utc::now()).await;
        for edge in drain_edges(it).await {
            assert!(
                seen.insert(edge.id),
                "iterator returned same edge in different partitions"
            );
            assert!(
                links_in_partition.contains(&edge.src),
                "iterator returned an edge whose source link belongs to a different partition"
            );
        }
    }
    seen.len()
}

pub async fn partitioned_edge_iterators(g: &dyn LinkGraphRepository) {
    let num_edges = 100;
    let ids = insert_links(g, num_edges + 1).await;
    for pair in ids.windows(2) {
        g.upsert_edge(&mut Edge::new(pair[0], pair[1])).await.unwrap();
    }

    assert_eq!(iterate_partitioned_edges(g, 10).await, num_edges);
    assert_eq!(iterate_partitioned_edges(g, 11).await, num_edges);
}

pub async fn remove_stale_edges(g: &dyn LinkGraphRepository) {
    let num_edges = 100;
    let ids = insert_links(g, num_edges * 4).await;

    let mut gone = HashSet::new();
    let mut last_ts = DateTime::<Utc>::default();
    for dst in &ids[..num_edges] {
        let mut edge = Edge::new(ids[0], *dst);
        g.upsert_edge(&mut edge).await.unwrap();
        gone.insert(edge.id);
        last_ts = edge.updated_at;
    }
    // Older than the cut-off but owned by another source link
    let mut foreign = Edge::new(ids[1], ids[2]);
    g.upsert_edge(&mut foreign).await.unwrap();

    let delete_before = last_ts + Duration::milliseconds(1);
    tokio::time::sleep(StdDuration::from_millis(250)).await;

    for dst in &ids[num_edges + 1..=num_edges * 2] {
        g.upsert_edge(&mut Edge::new(ids[0], *dst)).await.unwrap();
    }
    g.remove_stale_edges(ids[0], delete_before).await.unwrap();

    let edges = drain_edges(partitioned_edge_iterator(g, 0, 1, Utc::now()).await).await;
    let mut per_source: HashMap<Uuid, usize> = HashMap::new();
    for edge in &edges {
        assert!(
            !gone.contains(&edge.id),
            "expected edge {} to be removed",
            edge.id
        );
        *per_source.entry(edge.src).or_default() += 1;
    }
    assert_eq!(per_source.get(&ids[0]), Some(&num_edges));
    assert_eq!(per_source.get(&ids[1]), Some(&1));
}

pub async fn iterator_close_is_idempotent(g: &dyn LinkGraphRepository) {
    let ids = insert_links(g, 3).await;
    g.upsert_edge(&mut Edge::new(ids[0], ids[1])).await.unwrap();
    g.upsert_edge(&mut Edge::new(ids[0], ids[2])).await.unwrap();

    let mut links = partitioned_link_iterator(g, 0, 1, Utc::now()).await;
    assert!(links.next().await);
    links.close().await.unwrap();
    links.close().await.unwrap();
    assert!(!links.next().await);
    assert!(links.error().is_none());

    let mut edges = partitioned_edge_iterator(g, 0, 1, Utc::now()).await;
    assert!(edges.next().await);
    edges.close().await.unwrap();
    edges.close().await.unwrap();
    assert!(!edges.next().await);
    assert!(edges.error().is_none());

    // Draining to the end keeps returning false
    let mut links = partitioned_link_iterator(g, 0, 1, Utc::now()).await;
    while links.next().await {}
    assert!(!links.next().await);
    links.close().await.unwrap();
}
