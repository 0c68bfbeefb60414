// Evasion profiles: a fresh identity/header/delay bundle for every yt-dlp run

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Browser identities yt-dlp can present as
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Bounds (inclusive) for the per-request sleep, in seconds
pub const MIN_DELAY_SECS: u32 = 1;
pub const MAX_DELAY_SECS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvasionProfile {
    pub user_agent: String,
    /// (name, value) pairs passed as `--add-header name:value`
    pub headers: Vec<(String, String)>,
    pub delay_secs: u32,
}

impl EvasionProfile {
    pub fn new(user_agent: &str, delay_secs: u32) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            headers: default_headers(),
            delay_secs,
        }
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
        ("Accept".to_string(), ACCEPT.to_string()),
    ]
}

/// Where invocations get their profile from
pub trait ProfileSource: Send + Sync {
    fn sample(&self) -> EvasionProfile;
}

/// Uniform random selection over [`USER_AGENTS`] and the delay bounds
pub struct RandomProfiles {
    rng: Mutex<StdRng>,
}

impl RandomProfiles {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence, for tests and debugging
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomProfiles {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSource for RandomProfiles {
    fn sample(&self) -> EvasionProfile {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let user_agent = USER_AGENTS.choose(&mut *rng).copied().unwrap_or(USER_AGENTS[0]);
        let delay = rng.gen_range(MIN_DELAY_SECS..=MAX_DELAY_SECS);
        EvasionProfile::new(user_agent, delay)
    }
}

/// Always hands out the same profile
pub struct FixedProfile(pub EvasionProfile);

impl ProfileSource for FixedProfile {
    fn sample(&self) -> EvasionProfile {
        self.0.clone()
    }
}
