//! Cached answers looked up before running an expensive computation

mod answer_cache;


pub use answer_cache::{Answer, AnswerCache, CachedAnswers, HashCache};
