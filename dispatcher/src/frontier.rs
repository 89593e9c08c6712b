use crossbeam::queue::SegQueue;

/// The crawl frontier: a lock-free FIFO queue of urls awaiting crawl, safe
/// for any number of concurrent producers and consumers. No de-duplication:
/// the same url may sit in the queue multiple times. The configured maximum
/// size is declared but intentionally not enforced.
pub struct Frontier {
    queue: SegQueue<String>,
    max_size: usize,
}

impl Frontier {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: SegQueue::new(),
            max_size,
        }
    }

    /// Trim and enqueue. Blank urls are dropped silently.
    pub fn put(&self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        if self.queue.len() >= self.max_size {
            tracing::debug!(len = self.queue.len(), max = self.max_size, "frontier past declared limit, queueing anyway");
        }
        self.queue.push(url.to_string());
    }

    /// Non-blocking dequeue; `None` means no work right now.
    pub fn take(&self) -> Option<String> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_and_no_dedup() {
        let f = Frontier::new(100);
        f.put("http://x");
        f.put("http://y");
        f.put("http://x");
        assert_eq!(f.take().as_deref(), Some("http://x"));
        assert_eq!(f.take().as_deref(), Some("http://y"));
        assert_eq!(f.take().as_deref(), Some("http://x"));
        assert_eq!(f.take(), None);
    }

    #[test]
    fn trims_and_drops_blank() {
        let f = Frontier::new(100);
        f.put("  http://x  ");
        f.put("   ");
        f.put("");
        assert_eq!(f.len(), 1);
        assert_eq!(f.take().as_deref(), Some("http://x"));
    }

    #[test]
    fn declared_limit_is_not_enforced() {
        let f = Frontier::new(2);
        for i in 0..5 {
            f.put(&format!("http://{i}"));
        }
        assert_eq!(f.len(), 5);
    }
}
