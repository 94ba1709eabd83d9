//! Per-user conversation memory: the last topic and when the user was last seen.

use std::collections::HashMap;

use chrono::{DateTime, Local, TimeDelta};

/// What the last answered message was about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    Greeting,
    Thanks,
    Help,
    Time,
    Date,
    Math,
    Joke,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    topic: Topic,
    last_active: DateTime<Local>,
}

/// Bounded map from user id to last topic.
///
/// Entries idle for longer than `ttl` are dropped by [`sweep`](Self::sweep);
/// when full, inserting a new user evicts the least recently active one.
#[derive(Debug)]
pub struct TopicCache {
    entries: HashMap<String, Entry>,
    capacity: usize,
    ttl: TimeDelta,
}

impl TopicCache {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new(capacity: usize, ttl: TimeDelta) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries idle for longer than the ttl.
    pub fn sweep(&mut self, now: DateTime<Local>) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.last_active <= ttl);
    }

    pub fn last_topic(&self, user: &str) -> Option<Topic> {
        self.entries.get(user).map(|e| e.topic)
    }

    /// Records `topic` for `user` and marks them active at `now`.
    pub fn remember(&mut self, user: &str, topic: Topic, now: DateTime<Local>) {
        let entry = Entry {
            topic,
            last_active: now,
        };
        if let Some(existing) = self.entries.get_mut(user) {
            *existing = entry;
            return;
        }
        if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_active)
                .map(|(user, _)| user.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(user.to_string(), entry);
    }
}

impl Default for TopicCache {
    /// 10 000 users, 24 hour expiry.
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, TimeDelta::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_overwrite() {
        let mut cache = TopicCache::default();
        let now = Local::now();
        assert_eq!(cache.last_topic("u1"), None);

        cache.remember("u1", Topic::Greeting, now);
        cache.remember("u1", Topic::Math, now);
        assert_eq!(cache.last_topic("u1"), Some(Topic::Math));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_drops_idle_users() {
        let mut cache = TopicCache::default();
        let start = Local::now();
        cache.remember("idle", Topic::Joke, start);
        cache.remember("busy", Topic::Help, start + TimeDelta::hours(20));

        cache.sweep(start + TimeDelta::hours(24));
        assert_eq!(cache.len(), 2);

        cache.sweep(start + TimeDelta::hours(25));
        assert_eq!(cache.last_topic("idle"), None);
        assert_eq!(cache.last_topic("busy"), Some(Topic::Help));
    }

    #[test]
    fn test_evicts_least_recently_active() {
        let mut cache = TopicCache::new(2, TimeDelta::hours(24));
        let t0 = Local::now();
        cache.remember("a", Topic::Time, t0);
        cache.remember("b", Topic::Date, t0 + TimeDelta::seconds(1));
        cache.remember("a", Topic::Joke, t0 + TimeDelta::seconds(2));
        cache.remember("c", Topic::Math, t0 + TimeDelta::seconds(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.last_topic("b"), None);
        assert_eq!(cache.last_topic("a"), Some(Topic::Joke));
        assert_eq!(cache.last_topic("c"), Some(Topic::Math));
    }
}
