//! # Rule-based chat responder (the `cyber` demo bot).
//!
//! [`Responder::handle`] answers one message. Rules are tried in order and
//! the first hit wins:
//!
//! 1. greeting
//! 2. thanks
//! 3. help
//! 4. time
//! 5. date
//! 6. arithmetic ([`calculate`])
//! 7. joke
//! 8. follow-up based on the user's last topic
//! 9. fallback
//!
//! ## Example
//! ```
//! use botvisor::Responder;
//!
//! let mut bot = Responder::new();
//! let reply = bot.handle("u1", "5 + 7 * 2", chrono::Local::now()).unwrap();
//! assert!(reply.ends_with("19"));
//! ```

mod calc;
mod matcher;
mod topics;

pub use calc::calculate;
pub use matcher::{detect_emotion, is_match, normalize, Emotion};
pub use topics::{Topic, TopicCache};

use chrono::{DateTime, Local};
use rand::Rng;

const GREETING_WORDS: &[&str] = &[
    "hello", "hi", "helo", "hii", "hey", "assalamu", "salam", "asa", "kamon", "kemon",
    "kemon aso", "kamon aso", "kemon accho",
];
const THANKS_WORDS: &[&str] = &["thanks", "thank you", "dhonnobad", "shukriya", "tanks", "thnx"];
const HELP_WORDS: &[&str] = &["help", "sahayota", "command", "kicchu bol", "kichu bolo"];
const TIME_WORDS: &[&str] = &["time", "somoy", "shomoy"];
const DATE_WORDS: &[&str] = &["date", "tarikh", "tarik"];
const JOKE_WORDS: &[&str] = &["joke", "hashi", "funny", "mojar"];

const GREETING: &str = "👋 Assalamu Alaikum! Kemon aso? Ami *Cyber Bot*, tomar digital bondhu. \
Kichu jiggesh korle bolo, ami khushi hoye help korbo! 😊";

const THANKS: &str = "🙏 Apnakeo onek dhonnobad! Kichu lagle abar bolo, ami chesta korbo \
bhalo vabe sahajjo korte. 😄";

const HELP: &str = "🛠️ Ami onek kichu korte pari:\n\
- *time* / *somoy* => Akhon er somoy janate\n\
- *date* / *tarikh* => Ajker tarikh bolte pari\n\
- *math* question (jemon: 5 + 7 * 2) => calculation korte pari\n\
- *hello*, *hi*, *kemon aso* => greeting dite pari\n\
- *thanks*, *dhonnobad* => polite reply dite pari\n\
- *joke*, *hashi* => moja-mojar joke dite pari\n\
- Aar onek kichu, just bolo! 😎";

const FALLBACK: &str = "😕 Sorry, ami bujhte pari nai. Apni 'help' bolen, ami kichu command bolbo.\n\
Time, date, simple math solve korte pari. Try kore dekho! 🚀";

/// Jokes picked at random.
pub const JOKES: &[&str] = &[
    "😄 Ekta math problem: 2 + 2 = 5? Na, 4! 😂",
    "😂 Computer er friend ki? Byte! 😜",
    "🤣 Tomar math test kemon gelo? Ami je code likhi, test hoy na! 😅",
    "😆 Ami AI, tai ami kakhono tired hoyna, kintu tomar math problem dekhle amar head ache! 🤖",
];

/// Answers chat messages and remembers each user's last topic.
#[derive(Debug, Default)]
pub struct Responder {
    topics: TopicCache,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> &TopicCache {
        &self.topics
    }

    /// Reply to `text` from `user`, or `None` for a blank message.
    pub fn handle(&mut self, user: &str, text: &str, now: DateTime<Local>) -> Option<String> {
        self.topics.sweep(now);

        let raw = text.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_lowercase();
        let emotion = detect_emotion(&lower);
        let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let (topic, reply) = if is_match(&lower, GREETING_WORDS) {
            let prefix = if emotion == Some(Emotion::Happy) { "😊 " } else { "" };
            (Topic::Greeting, format!("{prefix}{GREETING}"))
        } else if is_match(&lower, THANKS_WORDS) {
            let prefix = if emotion == Some(Emotion::Happy) { "🙏✨ " } else { "" };
            (Topic::Thanks, format!("{prefix}{THANKS}"))
        } else if contains_any(HELP_WORDS) {
            (Topic::Help, HELP.to_string())
        } else if contains_any(TIME_WORDS) {
            (
                Topic::Time,
                format!("🕰️ Akhon er somoy holo: {}", now.format("%H:%M:%S")),
            )
        } else if contains_any(DATE_WORDS) {
            (
                Topic::Date,
                format!("📅 Ajker tarikh holo: {}", now.format("%A, %-d %B %Y")),
            )
        } else if let Ok(value) = calculate(raw) {
            (Topic::Math, format!("🧮 Math er uttor holo: {value}"))
        } else if is_match(&lower, JOKE_WORDS) {
            let joke = JOKES[rand::rng().random_range(0..JOKES.len())];
            (Topic::Joke, joke.to_string())
        } else {
            return Some(follow_up(self.topics.last_topic(user)).to_string());
        };

        self.topics.remember(user, topic, now);
        Some(reply)
    }
}

fn follow_up(last: Option<Topic>) -> &'static str {
    match last {
        Some(Topic::Greeting) => {
            "Aro kisu jante chaile 'help' bolio, ami tomake bhalo vabe assist korte parbo! 😊"
        }
        Some(Topic::Thanks) => "Ami to sahajjo korte chai! Kichu lagle janio. 🙌",
        Some(Topic::Help) => "Kichu command try korar proyojon hole bolo. Ami ready achi! 🤖",
        Some(Topic::Math) => "Aro math question thakle bolo, ami chesta korbo solve korte! 🧠",
        Some(Topic::Joke) => "Ar ekta joke sunte chaile bolo! 😄",
        Some(Topic::Time) | Some(Topic::Date) | None => FALLBACK,
    }
}
