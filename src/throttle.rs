use std::time::Duration;

/// Fixed-interval rate limiter for the external-call boundary. The pause is
/// unconditional: it runs after every item whether the call succeeded or not,
/// purely to keep the request rate under the services' limits.
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn zero_delay_returns_immediately() {
        let t = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        t.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn nonzero_delay_sleeps() {
        let t = Throttle::new(Duration::from_millis(20));
        let start = Instant::now();
        t.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
