use chrono::Utc;
use shared_types::{Question, QuestionId};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Question store is full ({capacity} questions)")]
    Exhausted { capacity: usize },
}

/// Produces ids from the wall clock in milliseconds, bumped past the last issued id so
/// two appends in the same millisecond (or a clock step backwards) never collide.
#[derive(Debug, Default)]
struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    fn next(&mut self, now_millis: u64) -> QuestionId {
        let id = now_millis.max(self.last + 1);
        self.last = id;
        QuestionId(id.to_string())
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    questions: Vec<Question>,
    ids: IdGenerator,
}

/// Append-only, insertion-ordered question log held in memory.
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    inner: Arc<RwLock<StoreInner>>,
    capacity: Option<usize>,
}

impl QuestionStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Record a new question and its answer, returning the stored record.
    ///
    /// The id is assigned under the write lock, so id order matches list order.
    pub fn append(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Question, StoreError> {
        let question = question.into();
        let answer = answer.into();

        let mut inner = self.write();
        if let Some(capacity) = self.capacity {
            if inner.questions.len() >= capacity {
                return Err(StoreError::Exhausted { capacity });
            }
        }

        let now = Utc::now().timestamp_millis().max(0) as u64;
        let record = Question {
            id: inner.ids.next(now),
            question,
            answer,
        };
        inner.questions.push(record.clone());

        Ok(record)
    }

    /// Snapshot of every record, oldest first
    pub fn list(&self) -> Vec<Question> {
        self.read().questions.clone()
    }

    pub fn len(&self) -> usize {
        self.read().questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a half-pushed record behind,
    // so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_new_store_is_empty() {
        let store = QuestionStore::unbounded();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_append_returns_stored_record() {
        let store = QuestionStore::unbounded();
        let created = store.append("What is 2+2?", "4").unwrap();

        assert!(!created.id.as_str().is_empty());
        assert_eq!(created.question, "What is 2+2?");
        assert_eq!(created.answer, "4");
        assert_eq!(store.list(), vec![created]);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = QuestionStore::unbounded();
        store.append("A", "a").unwrap();
        store.append("B", "b").unwrap();
        store.append("C", "c").unwrap();

        let questions: Vec<String> = store.list().into_iter().map(|q| q.question).collect();
        assert_eq!(questions, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ids_strictly_increase_within_one_millisecond() {
        let mut ids = IdGenerator::default();
        let first = ids.next(1_000);
        let second = ids.next(1_000);
        let third = ids.next(999);

        assert_eq!(first.as_str(), "1000");
        assert_eq!(second.as_str(), "1001");
        assert_eq!(third.as_str(), "1002");
    }

    #[test]
    fn test_ids_follow_clock_when_it_advances() {
        let mut ids = IdGenerator::default();
        ids.next(1_000);
        assert_eq!(ids.next(5_000).as_str(), "5000");
    }

    #[test]
    fn test_empty_question_is_accepted() {
        let store = QuestionStore::unbounded();
        let created = store.append("", "placeholder").unwrap();
        assert_eq!(created.question, "");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_capacity_bound_rejects_without_mutation() {
        let store = QuestionStore::new(Some(2));
        store.append("A", "a").unwrap();
        store.append("B", "b").unwrap();

        let err = store.append("C", "c").unwrap_err();
        assert_eq!(err, StoreError::Exhausted { capacity: 2 });
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clones_share_records() {
        let store = QuestionStore::unbounded();
        let handle = store.clone();
        handle.append("A", "a").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_appends() {
        let store = QuestionStore::unbounded();
        store.append("A", "a").unwrap();
        let snapshot = store.list();
        store.append("B", "b").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_appends_keep_every_record() {
        let store = QuestionStore::unbounded();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        store.append(format!("q-{t}-{i}"), "a").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let questions = store.list();
        assert_eq!(questions.len(), 400);

        let ids: HashSet<_> = questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 400);

        let texts: HashSet<_> = questions.iter().map(|q| q.question.clone()).collect();
        assert_eq!(texts.len(), 400);

        let numeric: Vec<u64> = questions
            .iter()
            .map(|q| q.id.as_str().parse().unwrap())
            .collect();
        assert!(numeric.windows(2).all(|w| w[0] < w[1]));
    }
}
