//! Canned post and comment text for simulated users.
//!
//! Each default community has a small pool of titles, bodies, and comments.
//! Communities without a pool fall back to placeholder text.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Title used when a community has no title pool.
pub const DEFAULT_TITLE: &str = "Default Title";
/// Body used when a community has no body pool.
pub const DEFAULT_CONTENT: &str = "Default Content";
/// Comment used when a community has no comment pool.
pub const DEFAULT_COMMENT: &str = "Default Comment";

struct Pool {
    subreddit: &'static str,
    titles: &'static [&'static str],
    contents: &'static [&'static str],
    comments: &'static [&'static str],
}

const POOLS: &[Pool] = &[
    Pool {
        subreddit: "AskReddit",
        titles: &[
            "What's the craziest thing you've ever done?",
            "If you could have dinner with any historical figure, who would it be?",
        ],
        contents: &[
            "I'm really curious to hear everyone's stories!",
            "Imagine the conversations you could have...",
        ],
        comments: &[
            "Wow, that's insane! I can't believe you actually did that.",
            "I'd choose Einstein. Imagine the mind-bending conversations!",
        ],
    },
    Pool {
        subreddit: "worldnews",
        titles: &[
            "Breaking: Major diplomatic breakthrough in Middle East",
            "New study shows alarming rate of climate change",
        ],
        contents: &[
            "This could have significant implications for global politics.",
            "The study calls for immediate action to mitigate the effects.",
        ],
        comments: &[
            "This is huge if true. Hope it leads to lasting peace.",
            "We need to take this seriously and act now before it's too late.",
        ],
    },
    Pool {
        subreddit: "funny",
        titles: &[
            "My dog's reaction when I pretend to throw the ball",
            "Found this gem while cleaning out my grandpa's attic",
        ],
        contents: &[
            "His face of betrayal is priceless!",
            "I can't believe this was just sitting there for years!",
        ],
        comments: &[
            "I can't stop laughing! The look on his face is priceless.",
            "Your grandpa must have been quite the character!",
        ],
    },
    Pool {
        subreddit: "gaming",
        titles: &[
            "After 500 hours, I finally beat this boss",
            "New leak suggests GTA 6 release date",
        ],
        contents: &[
            "The feeling of accomplishment is indescribable.",
            "If this is true, it's going to be a game-changer for the industry.",
        ],
        comments: &[
            "Congrats! That boss gave me nightmares for weeks.",
            "Please let this be true. I've been waiting for so long!",
        ],
    },
    Pool {
        subreddit: "aww",
        titles: &[
            "My rescue kitten's first day home",
            "This baby elephant learning to use its trunk",
        ],
        contents: &[
            "She's already claimed my heart and the best spot on the couch.",
            "Nature is truly amazing. Look at that playfulness!",
        ],
        comments: &[
            "She's adorable! You're so lucky to have found each other.",
            "Elephants are such intelligent and gentle creatures. This made my day!",
        ],
    },
    Pool {
        subreddit: "todayilearned",
        titles: &[
            "TIL the Great Wall of China is not visible from space",
            "TIL honey never spoils",
        ],
        contents: &[
            "It's actually a common misconception. Here's why...",
            "Archaeologists have found pots of honey in ancient Egyptian tombs that are still perfectly edible.",
        ],
        comments: &[
            "Mind blown! I've been telling people this for years.",
            "That's fascinating! Nature never ceases to amaze me.",
        ],
    },
    Pool {
        subreddit: "science",
        titles: &[
            "New breakthrough in quantum computing",
            "Scientists discover potential cure for common cold",
        ],
        contents: &[
            "This could revolutionize computing as we know it.",
            "The potential applications in medicine are enormous.",
        ],
        comments: &[
            "The implications of this are staggering. Can't wait to see where this leads.",
            "If this pans out, it could save millions of lives.",
        ],
    },
];

fn pool(subreddit: &str) -> Option<&'static Pool> {
    POOLS.iter().find(|p| p.subreddit == subreddit)
}

/// A generated post title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    /// Post title.
    pub title: &'static str,
    /// Post body.
    pub content: &'static str,
}

/// Pick a title and body for a post in `subreddit`.
pub fn post<R: Rng + ?Sized>(subreddit: &str, rng: &mut R) -> GeneratedPost {
    let Some(pool) = pool(subreddit) else {
        return GeneratedPost {
            title: DEFAULT_TITLE,
            content: DEFAULT_CONTENT,
        };
    };
    GeneratedPost {
        title: pool.titles.choose(rng).copied().unwrap_or(DEFAULT_TITLE),
        content: pool.contents.choose(rng).copied().unwrap_or(DEFAULT_CONTENT),
    }
}

/// Pick a comment for a post in `subreddit`.
pub fn comment<R: Rng + ?Sized>(subreddit: &str, rng: &mut R) -> &'static str {
    pool(subreddit)
        .and_then(|p| p.comments.choose(rng).copied())
        .unwrap_or(DEFAULT_COMMENT)
}

/// Direct message body from `from` to `to`.
pub fn direct_message(from: &str, to: &str) -> String {
    format!("Hello from {from} to {to}!")
}

/// Shorten `text` to at most `max_chars` characters for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
