use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::ports::text_indexer::{DocumentIterator, IndexError, TextIndexer};
use crate::domain::documents::document::{Document, DocumentQuery};

fn sample_document(link_id: Uuid) -> Document {
    Document {
        link_id,
        url: "https://example.com".into(),
        title: "Illustrious examples".into(),
        content: "Lorem ipsum dolor".into(),
        indexed_at: Some(Utc::now() - Duration::hours(12)),
        page_rank: 0.0,
    }
}

fn titled(link_id: Uuid, content: &str) -> Document {
    Document {
        link_id,
        title: format!("doc with ID {link_id}"),
        content: content.into(),
        ..Document::default()
    }
}

async fn drain(mut it: Box<dyn DocumentIterator>) -> Vec<Uuid> {
    let mut seen = Vec::new();
    while it.next().await {
        seen.push(it.document().link_id);
    }
    assert!(it.error().is_none(), "document iterator failed: {:?}", it.error());
    it.close().await.unwrap();
    seen
}

/// Indexes `num_docs` documents ranked in insertion order; `content_for` picks
/// each body by position.
async fn index_ranked(
    idx: &dyn TextIndexer,
    num_docs: usize,
    content_for: impl Fn(usize) -> &'static str,
) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(num_docs);
    for i in 0..num_docs {
        let id = Uuid::new_v4();
        idx.index(&mut titled(id, content_for(i))).await.unwrap();
        idx.update_score(id, (num_docs - i) as f64).await.unwrap();
        ids.push(id);
    }
    ids
}

pub async fn index_document(idx: &dyn TextIndexer) {
    let mut doc = sample_document(Uuid::new_v4());
    idx.index(&mut doc).await.unwrap();
    assert!(doc.indexed_at.is_some_and(|at| at > Utc::now() - Duration::minutes(1)));

    let mut updated = Document {
        title: "A more exciting title".into(),
        content: "Ovidius poeta in terra pontica".into(),
        ..sample_document(doc.link_id)
    };
    idx.index(&mut updated).await.unwrap();
    let stored = idx.find_by_id(doc.link_id).await.unwrap();
    assert_eq!(stored.title, "A more exciting title");
    assert_eq!(stored.content, "Ovidius poeta in terra pontica");

    let mut incomplete = Document {
        url: "https://example.com".into(),
        ..Document::default()
    };
    assert!(matches!(
        idx.index(&mut incomplete).await,
        Err(IndexError::MissingLinkId)
    ));
}

pub async fn index_does_not_override_page_rank(idx: &dyn TextIndexer) {
    let mut doc = sample_document(Uuid::new_v4());
    idx.index(&mut doc).await.unwrap();

    let expected = 0.5;
    idx.update_score(doc.link_id, expected).await.unwrap();

    let mut updated = Document {
        title: "A more exciting title".into(),
        content: "Ovidius poeta in terra pontica".into(),
        page_rank: 0.9,
        ..sample_document(doc.link_id)
    };
    idx.index(&mut updated).await.unwrap();

    let got = idx.find_by_id(doc.link_id).await.unwrap();
    assert_eq!(got.page_rank, expected);
    assert_eq!(got.content, "Ovidius poeta in terra pontica");
}

pub async fn find_by_id(idx: &dyn TextIndexer) {
    let mut doc = sample_document(Uuid::new_v4());
    idx.index(&mut doc).await.unwrap();

    let got = idx.find_by_id(doc.link_id).await.unwrap();
    assert_eq!(got, doc, "document returned by find_by_id does not match inserted document");

    assert!(matches!(
        idx.find_by_id(Uuid::new_v4()).await,
        Err(IndexError::NotFound)
    ));
}

pub async fn phrase_search(idx: &dyn TextIndexer) {
    let num_docs = 50;
    let ids = index_ranked(idx, num_docs, |i| {
        if i % 5 == 0 {
            "Lorem Dolor Ipsum"
        } else {
            "Lorem Ipsum Dolor"
        }
    })
    .await;
    let expected: Vec<_> = ids.iter().step_by(5).copied().collect();

    let it = idx.search(&DocumentQuery::phrase("lorem dolor ipsum")).await.unwrap();
    assert_eq!(it.total_count(), expected.len() as u64);
    assert_eq!(drain(it).await, expected);
}

pub async fn match_search(idx: &dyn TextIndexer) {
    let num_docs = 50;
    let ids = index_ranked(idx, num_docs, |i| {
        if i % 5 == 0 {
            "Lorem Dolor Ipsum"
        } else {
            "Ovidius poeta in terra pontica"
        }
    })
    .await;
    let expected: Vec<_> = ids.iter().step_by(5).copied().collect();

    let it = idx.search(&DocumentQuery::matching("lorem ipsum")).await.unwrap();
    assert_eq!(drain(it).await, expected);
}

pub async fn match_search_with_offset(idx: &dyn TextIndexer) {
    let num_docs = 50;
    let ids = index_ranked(idx, num_docs, |_| "Ovidius poeta in terra pontica").await;

    let it = idx
        .search(&DocumentQuery::matching("poeta").with_offset(20))
        .await
        .unwrap();
    assert_eq!(it.total_count(), num_docs as u64);
    assert_eq!(drain(it).await, ids[20..].to_vec());

    // Offset beyond the total number of results
    let it = idx
        .search(&DocumentQuery::matching("poeta").with_offset(200))
        .await
        .unwrap();
    assert!(drain(it).await.is_empty());
}

pub async fn update_score(idx: &dyn TextIndexer) {
    let num_docs = 100;
    let mut ids = index_ranked(idx, num_docs, |_| "Ovidius poeta in terra pontica").await;

    let it = idx.search(&DocumentQuery::matching("poeta")).await.unwrap();
    assert_eq!(drain(it).await, ids);

    // Reverse the ranking
    for (i, id) in ids.iter().enumerate() {
        idx.update_score(*id, i as f64).await.unwrap();
    }

    let it = idx.search(&DocumentQuery::matching("poeta")).await.unwrap();
    ids.reverse();
    assert_eq!(drain(it).await, ids);
}

pub async fn update_score_for_unknown_document(idx: &dyn TextIndexer) {
    let link_id = Uuid::new_v4();
    idx.update_score(link_id, 0.5).await.unwrap();

    let doc = idx.find_by_id(link_id).await.unwrap();
    assert_eq!(doc, Document::placeholder(link_id, 0.5));
    assert!(doc.url.is_empty() && doc.title.is_empty() && doc.content.is_empty());
    assert!(doc.indexed_at.is_none());
}

pub async fn non_finite_scores_are_rejected(idx: &dyn TextIndexer) {
    let ranks = [0.0, 1.0, 3.0, 4.0];
    for rank in ranks {
        let link_id = Uuid::new_v4();
        idx.index(&mut titled(link_id, "Ovidius poeta")).await.unwrap();
        idx.update_score(link_id, rank).await.unwrap();
    }

    let victim = Uuid::new_v4();
    idx.index(&mut titled(victim, "Ovidius poeta")).await.unwrap();
    for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = idx.update_score(victim, score).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidScore), "unexpected error: {err:?}");
    }
    assert_eq!(idx.find_by_id(victim).await.unwrap().page_rank, 0.0);

    let mut doc = titled(Uuid::new_v4(), "Ovidius poeta");
    doc.page_rank = f64::NAN;
    assert!(matches!(idx.index(&mut doc).await, Err(IndexError::InvalidScore)));
    assert!(matches!(idx.find_by_id(doc.link_id).await, Err(IndexError::NotFound)));

    let mut it = idx.search(&DocumentQuery::matching("poeta")).await.unwrap();
    let mut seen = Vec::new();
    while it.next().await {
        seen.push(it.document().page_rank);
    }
    it.close().await.unwrap();
    assert_eq!(seen, vec![4.0, 3.0, 1.0, 0.0, 0.0]);
}

pub async fn unmatched_search_is_empty(idx: &dyn TextIndexer) {
    index_ranked(idx, 3, |_| "Ovidius poeta in terra pontica").await;

    let mut it = idx.search(&DocumentQuery::matching("nonexistent")).await.unwrap();
    assert_eq!(it.total_count(), 0);
    assert!(!it.next().await);
    it.close().await.unwrap();
    it.close().await.unwrap();
}
