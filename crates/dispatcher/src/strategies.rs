use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use docsched_core::{LoadBalancer, SchedulerError, SchedulerResult, WorkerId, WorkerRecord};

/// 轮询策略
///
/// 计数器全局单调递增且从不重置，两次选择之间成员列表变化时
/// 可能跳过或重复某个 Worker，长期来看仍然均衡。
pub struct RoundRobinStrategy {
    counter: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for RoundRobinStrategy {
    fn select(&self, worker_ids: &[WorkerId]) -> Option<WorkerId> {
        if worker_ids.is_empty() {
            debug!("没有可用的Worker节点");
            return None;
        }

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % worker_ids.len();
        let selected = &worker_ids[index];
        debug!(
            "轮询策略选择Worker: {} (索引: {}/{})",
            selected,
            index,
            worker_ids.len()
        );
        Some(selected.clone())
    }

    fn name(&self) -> &str {
        "rr"
    }
}

/// 加权轮询策略
///
/// 每个 Worker 按权重重复展开成一个列表，再用共享计数器取下标。
/// 未观察到权重的 Worker 权重为 1。
pub struct WeightedRoundRobinStrategy {
    counter: AtomicUsize,
    weights: RwLock<HashMap<WorkerId, u32>>,
}

impl WeightedRoundRobinStrategy {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            weights: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_weight(&self, worker_id: &str, weight: u32) {
        match self.weights.write() {
            Ok(mut weights) => {
                weights.insert(worker_id.to_string(), weight.max(1));
            }
            Err(e) => warn!("权重表锁已损坏，忽略Worker {} 的权重: {}", worker_id, e),
        }
    }

    fn weight_of(weights: &HashMap<WorkerId, u32>, worker_id: &str) -> usize {
        weights.get(worker_id).copied().unwrap_or(1).max(1) as usize
    }
}

impl Default for WeightedRoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for WeightedRoundRobinStrategy {
    fn select(&self, worker_ids: &[WorkerId]) -> Option<WorkerId> {
        if worker_ids.is_empty() {
            debug!("没有可用的Worker节点");
            return None;
        }

        let weights = match self.weights.read() {
            Ok(weights) => weights,
            Err(poisoned) => poisoned.into_inner(),
        };

        let total: usize = worker_ids
            .iter()
            .map(|id| Self::weight_of(&weights, id))
            .sum();
        let mut slot = self.counter.fetch_add(1, Ordering::Relaxed) % total;

        for id in worker_ids {
            let weight = Self::weight_of(&weights, id);
            if slot < weight {
                debug!("加权轮询策略选择Worker: {} (权重: {}/{})", id, weight, total);
                return Some(id.clone());
            }
            slot -= weight;
        }

        None
    }

    fn name(&self) -> &str {
        "wrr"
    }

    fn observe(&self, worker: &WorkerRecord) {
        self.set_weight(&worker.id, worker.weight);
    }

    fn forget(&self, worker_id: &str) {
        if let Ok(mut weights) = self.weights.write() {
            weights.remove(worker_id);
        }
    }
}

/// 按名称创建负载均衡策略
pub fn load_balancer_from_name(name: &str) -> SchedulerResult<Arc<dyn LoadBalancer>> {
    match name {
        "rr" => Ok(Arc::new(RoundRobinStrategy::new())),
        "wrr" => Ok(Arc::new(WeightedRoundRobinStrategy::new())),
        other => Err(SchedulerError::Configuration(format!(
            "未知的负载均衡策略: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsched_core::WorkerRegistration;
    use std::collections::HashSet;

    fn ids(names: &[&str]) -> Vec<WorkerId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_robin_period() {
        let strategy = RoundRobinStrategy::new();
        let workers = ids(&["A", "B", "C"]);

        let picks: Vec<WorkerId> = (0..6)
            .map(|_| strategy.select(&workers).unwrap())
            .collect();

        assert_eq!(picks[..3], picks[3..]);
        let distinct: HashSet<&WorkerId> = picks[..3].iter().collect();
        assert_eq!(distinct.len(), 3);
        for id in &workers {
            assert_eq!(picks.iter().filter(|p| *p == id).count(), 2);
        }
    }

    #[test]
    fn test_empty_selection() {
        assert!(RoundRobinStrategy::new().select(&[]).is_none());
        assert!(WeightedRoundRobinStrategy::new().select(&[]).is_none());
    }

    #[test]
    fn test_round_robin_concurrent_fairness() {
        let strategy = Arc::new(RoundRobinStrategy::new());
        let workers = Arc::new(ids(&["A", "B", "C", "D"]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let strategy = Arc::clone(&strategy);
                let workers = Arc::clone(&workers);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| strategy.select(&workers).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<WorkerId, usize> = HashMap::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                *counts.entry(id).or_default() += 1;
            }
        }

        // 400 次选择在 4 个 Worker 上严格均分
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 100));
    }

    #[test]
    fn test_weighted_round_robin_distribution() {
        let strategy = WeightedRoundRobinStrategy::new();
        strategy.observe(&WorkerRecord::new(
            WorkerRegistration::new("A", "h:1").with_weight(3),
        ));
        let workers = ids(&["A", "B"]);

        let picks: Vec<WorkerId> = (0..8)
            .map(|_| strategy.select(&workers).unwrap())
            .collect();

        assert_eq!(picks, ids(&["A", "A", "A", "B", "A", "A", "A", "B"]));

        strategy.forget("A");
        let picks: Vec<WorkerId> = (0..2)
            .map(|_| strategy.select(&workers).unwrap())
            .collect();
        let distinct: HashSet<&WorkerId> = picks.iter().collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn test_load_balancer_from_name() {
        assert_eq!(load_balancer_from_name("rr").unwrap().name(), "rr");
        assert_eq!(load_balancer_from_name("wrr").unwrap().name(), "wrr");
        assert!(matches!(
            load_balancer_from_name("random"),
            Err(SchedulerError::Configuration(_))
        ));
    }
}
