use std::cmp::Ordering;

use rand::Rng;

use crate::{
    domain::MemeRepository,
    errors::AppError,
    models::{Meme, RatingSummary, TopMeme},
};

/// How many memes the top-rated listing returns.
pub const TOP_RATED_LIMIT: usize = 10;

/// Picks one meme uniformly at random without loading the whole collection.
pub async fn random_meme(repo: &dyn MemeRepository) -> Result<Meme, AppError> {
    let count = repo.count_memes().await?;
    if count == 0 {
        return Err(AppError::NoMemesFound);
    }

    let offset = rand::thread_rng().gen_range(0..count);
    tracing::debug!(count, offset, "Selecting random meme");
    // Memes are never deleted, so the drawn offset stays valid.
    repo.meme_at(offset).await?.ok_or(AppError::NoMemesFound)
}

/// Mean score of a summary. Callers only build summaries for rated memes.
pub fn mean_score(summary: &RatingSummary) -> f64 {
    summary.score_total as f64 / summary.rating_count as f64
}

/// Orders rated memes by mean score, best first, ties by meme id ascending,
/// and keeps at most `limit`. Summaries with no ratings are dropped.
pub fn rank(summaries: Vec<RatingSummary>, limit: usize) -> Vec<TopMeme> {
    let mut ranked: Vec<TopMeme> = summaries
        .into_iter()
        .filter(|s| s.rating_count > 0)
        .map(|s| TopMeme {
            avg_rating: mean_score(&s),
            id: s.meme.id,
            template: s.meme.template_id,
            top_text: s.meme.top_text,
            bottom_text: s.meme.bottom_text,
        })
        .collect();

    ranked.sort_by(|a, b| match b.avg_rating.total_cmp(&a.avg_rating) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    ranked.truncate(limit);
    ranked
}

/// The best rated memes; memes nobody rated never appear.
pub async fn top_rated(repo: &dyn MemeRepository) -> Result<Vec<TopMeme>, AppError> {
    let summaries = repo.rating_summaries(TOP_RATED_LIMIT as u32).await?;
    let ranked = rank(summaries, TOP_RATED_LIMIT);
    tracing::debug!("Ranked {} top memes", ranked.len());
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CredentialStore;
    use crate::models::{NewMeme, NewMemeTemplate, NewUser};
    use crate::repositories::SqliteStore;
    use chrono::Utc;

    fn summary(id: i64, scores: &[i64]) -> RatingSummary {
        RatingSummary {
            meme: Meme {
                id,
                template_id: 1,
                top_text: format!("top {}", id),
                bottom_text: format!("bottom {}", id),
                created_by: 1,
                created_at: Utc::now(),
            },
            rating_count: scores.len() as i64,
            score_total: scores.iter().sum(),
        }
    }

    #[test]
    fn rank_orders_by_mean_then_id() {
        let ranked = rank(
            vec![summary(3, &[4]), summary(1, &[5, 4]), summary(2, &[4, 4]), summary(4, &[5])],
            10,
        );
        let order: Vec<(i64, f64)> = ranked.iter().map(|m| (m.id, m.avg_rating)).collect();
        assert_eq!(order, vec![(4, 5.0), (1, 4.5), (2, 4.0), (3, 4.0)]);
    }

    #[test]
    fn rank_drops_unrated_and_truncates() {
        let mut summaries: Vec<RatingSummary> = (1..=12).map(|id| summary(id, &[3])).collect();
        summaries.push(summary(99, &[]));
        let ranked = rank(summaries, TOP_RATED_LIMIT);
        assert_eq!(ranked.len(), TOP_RATED_LIMIT);
        assert!(ranked.iter().all(|m| m.id != 99));
        assert_eq!(ranked.first().map(|m| m.id), Some(1));
    }

    async fn seeded_store(memes: usize) -> (SqliteStore, Vec<Meme>) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let template = store
            .create_template(NewMemeTemplate {
                name: "T".into(),
                image_url: "https://example.com/t.png".into(),
                default_top_text: String::new(),
                default_bottom_text: String::new(),
            })
            .await
            .unwrap();
        let mut created = Vec::new();
        for i in 0..memes {
            created.push(
                store
                    .create_meme(NewMeme {
                        template_id: template.id,
                        top_text: format!("top {}", i),
                        bottom_text: format!("bottom {}", i),
                        created_by: user.id,
                    })
                    .await
                    .unwrap(),
            );
        }
        (store, created)
    }

    #[tokio::test]
    async fn random_meme_on_empty_store() {
        let (store, _) = seeded_store(0).await;
        assert!(matches!(random_meme(&store).await, Err(AppError::NoMemesFound)));
    }

    #[tokio::test]
    async fn random_meme_returns_an_existing_meme() {
        let (store, memes) = seeded_store(3).await;
        for _ in 0..20 {
            let picked = random_meme(&store).await.unwrap();
            assert!(memes.iter().any(|m| m.id == picked.id));
        }
    }

    #[tokio::test]
    async fn top_rated_averages_existing_ratings_only() {
        let (store, memes) = seeded_store(2).await;
        let mut raters = Vec::new();
        for name in ["bob", "carol"] {
            raters.push(
                store
                    .create_user(NewUser {
                        username: name.into(),
                        email: format!("{}@example.com", name),
                        password_hash: "hash".into(),
                    })
                    .await
                    .unwrap(),
            );
        }
        store.upsert_rating(memes[0].id, raters[0].id, 5).await.unwrap();
        store.upsert_rating(memes[0].id, raters[1].id, 4).await.unwrap();

        let top = top_rated(&store).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, memes[0].id);
        assert_eq!(top[0].avg_rating, 4.5);
    }

    #[tokio::test]
    async fn top_rated_caps_at_ten_and_breaks_ties_by_id() {
        let (store, memes) = seeded_store(12).await;
        let alice = memes[0].created_by;
        let bob = store
            .create_user(NewUser {
                username: "bob".into(),
                email: "bob@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        for (i, meme) in memes.iter().enumerate() {
            let score = match i {
                11 => 5,
                5 | 7 => 4,
                _ => 3,
            };
            store.upsert_rating(meme.id, alice, score).await.unwrap();
        }
        // Same mean as memes[5] from two ratings.
        store.upsert_rating(memes[7].id, bob.id, 4).await.unwrap();

        let top = top_rated(&store).await.unwrap();
        let ids: Vec<i64> = top.iter().map(|m| m.id).collect();
        let expected: Vec<i64> = [11, 5, 7, 0, 1, 2, 3, 4, 6, 8].iter().map(|&i| memes[i].id).collect();
        assert_eq!(ids, expected);
        assert_eq!(top[1].avg_rating, 4.0);
        assert_eq!(top[2].avg_rating, 4.0);
    }
}
