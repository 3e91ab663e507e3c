//! Horoscope sources.
//!
//! The application talks to a [`HoroscopeProvider`]; by default that is the
//! [`SimulatedProvider`], which sleeps for a random moment and then either
//! returns canned text or fails like a flaky network would.
//! [`HttpProvider`] fetches from a real endpoint with a hard timeout.

use chrono::Utc;
use futures::future::BoxFuture;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::date_key::date_key;
use crate::error::ProviderError;
use crate::zodiac::ZodiacSign;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horoscope {
    pub sign: ZodiacSign,
    pub horoscope: String,
    pub date: String,
}

pub trait HoroscopeProvider: Send + Sync {
    /// Resolves after some latency; may fail regardless of the sign.
    fn fetch(&self, sign: ZodiacSign) -> BoxFuture<'_, Result<Horoscope, ProviderError>>;
}

pub fn canned_text(sign: ZodiacSign) -> &'static str {
    match sign {
        ZodiacSign::Aries => "Today brings dynamic energy and new opportunities. Trust your instincts and take bold action towards your goals. The stars align to support your leadership qualities.",
        ZodiacSign::Taurus => "Stability and patience will serve you well today. Focus on building solid foundations for your future endeavors. Material gains are possible through steady effort.",
        ZodiacSign::Gemini => "Communication is key today. Express your thoughts clearly and listen to others with an open mind. Multiple opportunities may present themselves simultaneously.",
        ZodiacSign::Cancer => "Your intuition is heightened today. Pay attention to your emotional responses and nurture meaningful relationships. Family matters may require attention.",
        ZodiacSign::Leo => "Confidence shines through you today. Take center stage and let your creativity illuminate the path forward. Recognition for past efforts is likely.",
        ZodiacSign::Virgo => "Attention to detail pays off today. Organize your thoughts and tackle tasks with precision and care. Health and wellness should be prioritized.",
    }
}

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_FAILURE_RATE: f64 = 0.1;

/// Canned horoscopes behind a delay drawn uniformly from `[min, max)`.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    min_delay: Duration,
    max_delay: Duration,
    failure_rate: f64,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        SimulatedProvider {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            failure_rate: DEFAULT_FAILURE_RATE,
        }
    }
}

impl SimulatedProvider {
    pub fn new() -> Self {
        SimulatedProvider::default()
    }

    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Clamped to `[0.0, 1.0]`; 0 never fails, 1 always fails.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn roll(&self) -> (Duration, bool) {
        let mut rng = rand::thread_rng();
        let delay = if self.max_delay > self.min_delay {
            rng.gen_range(self.min_delay..self.max_delay)
        } else {
            self.min_delay
        };
        (delay, rng.gen_bool(self.failure_rate))
    }
}

impl HoroscopeProvider for SimulatedProvider {
    fn fetch(&self, sign: ZodiacSign) -> BoxFuture<'_, Result<Horoscope, ProviderError>> {
        let (delay, fail) = self.roll();
        Box::pin(async move {
            debug!(sign = sign.id(), delay_ms = delay.as_millis() as u64, "simulated fetch");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(ProviderError::Connection);
            }
            Ok(Horoscope {
                sign,
                horoscope: canned_text(sign).to_string(),
                date: date_key(&Utc::now()),
            })
        })
    }
}

/// `GET {base_url}/{sign}` returning a JSON [`Horoscope`].
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        HttpProvider {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url_for(&self, sign: ZodiacSign) -> String {
        format!("{}/{}", self.base_url, sign.id())
    }

    fn map_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout.as_secs())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Connection
        }
    }

    async fn request(&self, sign: ZodiacSign) -> Result<Horoscope, ProviderError> {
        let response = self
            .client
            .get(self.url_for(sign))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "horoscope service rejected request");
            return Err(ProviderError::Status(status.as_u16()));
        }
        response
            .json::<Horoscope>()
            .await
            .map_err(|e| self.map_error(e))
    }
}

impl HoroscopeProvider for HttpProvider {
    fn fetch(&self, sign: ZodiacSign) -> BoxFuture<'_, Result<Horoscope, ProviderError>> {
        Box::pin(self.request(sign))
    }
}
