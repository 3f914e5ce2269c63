use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;

/// Hash-keyed cache capability (Redis `HEXISTS`/`HGET`)
#[async_trait]
pub trait HashCache: Send + Sync {
    /// Whether `field` is set in hash `name`
    async fn hexists(&self, name: &str, field: &str) -> Result<bool, String>;
    /// Value of `field` in hash `name`
    async fn hget(&self, name: &str, field: &str) -> Result<Option<String>, String>;
}

/// One `{phrase: answer}` map per cached phrase, in request order
pub type CachedAnswers = Vec<BTreeMap<String, String>>;

/// Result of [`AnswerCache::answer_or_else`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Cached(CachedAnswers),
    Computed(T),
}

/// Per-user answer cache stored in hash `user_id-><id>`
pub struct AnswerCache<C: HashCache> {
    cache: C,
}

impl<C: HashCache> AnswerCache<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Name of the hash holding a user's answers
    pub fn hash_name(user_id: i64) -> String {
        format!("user_id->{}", user_id)
    }

    /// Cached answers for the trimmed `phrases`, skipping uncached ones
    pub async fn lookup<S: AsRef<str>>(
        &self,
        user_id: i64,
        phrases: &[S],
    ) -> Result<CachedAnswers, String> {
        let name = Self::hash_name(user_id);
        let mut answers = Vec::new();

        for phrase in phrases {
            let phrase = phrase.as_ref().trim();
            if !self.cache.hexists(&name, phrase).await? {
                continue;
            }
            // The field may expire between the two calls
            if let Some(answer) = self.cache.hget(&name, phrase).await? {
                answers.push(BTreeMap::from([(phrase.to_owned(), answer)]));
            }
        }

        Ok(answers)
    }

    /// Answer from the cache when any phrase is cached, otherwise run
    /// `compute`
    pub async fn answer_or_else<S, T, F, Fut>(
        &self,
        user_id: i64,
        phrases: &[S],
        compute: F,
    ) -> Result<Answer<T>, String>
    where
        S: AsRef<str>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cached = self.lookup(user_id, phrases).await?;
        if !cached.is_empty() {
            tracing::debug!(user_id, hits = cached.len(), "Answered from cache");
            return Ok(Answer::Cached(cached));
        }
        Ok(Answer::Computed(compute().await))
    }
}
