//! Buffer contract properties, run against every synchronization strategy
//!
//! Each test iterates over `SyncStrategy::ALL` so the four backends are held
//! to the identical contract: capacity bound, FIFO order, blocking behavior,
//! cancel safety, bounded waits, and shutdown-with-drain.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use slotq::{BufferCfg, QueueError, SlotBuffer, SlotQueue, SyncStrategy};

fn queue(capacity: usize, strategy: SyncStrategy) -> Arc<SlotQueue<u64>> {
    Arc::new(SlotQueue::new(&BufferCfg::new(capacity, strategy)).unwrap())
}

#[tokio::test]
async fn test_fifo_single_producer_single_consumer() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(8, strategy);
        for i in 0..8u64 {
            buffer.produce(i).await.unwrap();
        }
        for expected in 0..8u64 {
            assert_eq!(
                buffer.consume().await.unwrap(),
                expected,
                "order broken for {strategy:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_len_never_exceeds_capacity() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(3, strategy);
        let writer = Arc::clone(&buffer);
        let producer = tokio::spawn(async move {
            for i in 0..50u64 {
                writer.produce(i).await.unwrap();
            }
        });

        let mut seen = 0;
        while seen < 50 {
            let len = buffer.len();
            assert!(len <= 3, "len {len} exceeds capacity for {strategy:?}");
            if buffer.consume().await.is_ok() {
                seen += 1;
            }
        }
        producer.await.unwrap();
        assert!(buffer.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_loss_no_duplication_under_contention() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(5, strategy);

        // Two producers with disjoint value ranges.
        let mut producers = Vec::new();
        for base in [0u64, 1_000] {
            let writer = Arc::clone(&buffer);
            producers.push(tokio::spawn(async move {
                for i in base..base + 50 {
                    writer.produce(i).await.unwrap();
                }
            }));
        }

        let mut consumers = Vec::new();
        for _ in 0..2 {
            let reader = Arc::clone(&buffer);
            consumers.push(tokio::spawn(async move {
                let mut got = Vec::new();
                loop {
                    match reader.consume().await {
                        Ok(item) => got.push(item),
                        Err(QueueError::Shutdown { .. }) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                got
            }));
        }

        for p in producers {
            p.await.unwrap();
        }
        buffer.shutdown();

        let mut all = HashSet::new();
        for c in consumers {
            for item in c.await.unwrap() {
                assert!(all.insert(item), "duplicate item for {strategy:?}");
            }
        }
        assert_eq!(all.len(), 100, "items lost for {strategy:?}");
    }
}

#[tokio::test]
async fn test_consume_blocks_on_empty_until_produce() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(4, strategy);
        let reader = Arc::clone(&buffer);
        let blocked = tokio::spawn(async move { reader.consume().await });

        // Give the consumer every chance to finish if it were not blocking.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished(), "consume returned early for {strategy:?}");

        buffer.produce(7).await.unwrap();
        assert_eq!(blocked.await.unwrap().unwrap(), 7);
    }
}

#[tokio::test]
async fn test_produce_blocks_on_full_until_consume() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(1, strategy);
        buffer.produce(1).await.unwrap();

        let writer = Arc::clone(&buffer);
        let blocked = tokio::spawn(async move { writer.produce(2).await });

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished(), "produce returned early for {strategy:?}");

        assert_eq!(buffer.consume().await.unwrap(), 1);
        blocked.await.unwrap().unwrap();
        assert_eq!(buffer.consume().await.unwrap(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_produce_leaves_occupancy_consistent() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(2, strategy);
        buffer.produce(1).await.unwrap();
        buffer.produce(2).await.unwrap();

        // Dropping the blocked produce future models a targeted interruption
        // of one waiter. Nothing may be enqueued by it.
        let result = tokio::time::timeout(Duration::from_millis(20), buffer.produce(3)).await;
        assert!(result.is_err(), "produce completed on a full buffer for {strategy:?}");

        assert_eq!(buffer.len(), 2, "occupancy drifted for {strategy:?}");
        assert_eq!(buffer.consume().await.unwrap(), 1);
        assert_eq!(buffer.consume().await.unwrap(), 2);
        assert!(matches!(buffer.try_consume(), Err(QueueError::Empty)));

        // The slot freed by a cancelled waiter is still usable.
        buffer.produce(4).await.unwrap();
        assert_eq!(buffer.consume().await.unwrap(), 4);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_consume_removes_nothing() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(2, strategy);

        let result = tokio::time::timeout(Duration::from_millis(20), buffer.consume()).await;
        assert!(result.is_err(), "consume completed on an empty buffer for {strategy:?}");

        buffer.produce(9).await.unwrap();
        assert_eq!(buffer.len(), 1, "occupancy drifted for {strategy:?}");
        assert_eq!(buffer.consume().await.unwrap(), 9);
    }
}

#[tokio::test(start_paused = true)]
async fn test_produce_timeout_on_full_buffer() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(1, strategy);
        buffer.produce(1).await.unwrap();

        let started = tokio::time::Instant::now();
        let result = buffer.produce_timeout(2, Duration::from_millis(200)).await;
        assert!(
            matches!(result, Err(QueueError::ProduceTimeout { waited_ms: 200 })),
            "wrong outcome for {strategy:?}: {result:?}"
        );
        assert!(started.elapsed() >= Duration::from_millis(200));

        // The timed-out item was given up; the original is intact.
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.consume().await.unwrap(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_consume_timeout_on_empty_buffer() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(4, strategy);

        let result = buffer.consume_timeout(Duration::from_millis(100)).await;
        assert!(
            matches!(result, Err(QueueError::ConsumeTimeout { waited_ms: 100 })),
            "wrong outcome for {strategy:?}: {result:?}"
        );
        assert!(buffer.is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_success_when_slot_frees_in_time() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(1, strategy);
        buffer.produce(1).await.unwrap();

        let reader = Arc::clone(&buffer);
        let freeing = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            reader.consume().await.unwrap()
        });

        buffer
            .produce_timeout(2, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(freeing.await.unwrap(), 1);
        assert_eq!(buffer.consume().await.unwrap(), 2);
    }
}

#[tokio::test]
async fn test_shutdown_wakes_blocked_consumers() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(4, strategy);

        let mut blocked = Vec::new();
        for _ in 0..3 {
            let reader = Arc::clone(&buffer);
            blocked.push(tokio::spawn(async move { reader.consume().await }));
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        buffer.shutdown();
        for task in blocked {
            let result = task.await.unwrap();
            assert!(
                matches!(result, Err(QueueError::Shutdown { .. })),
                "waiter not woken for {strategy:?}: {result:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_shutdown_wakes_blocked_producers() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(1, strategy);
        buffer.produce(1).await.unwrap();

        let writer = Arc::clone(&buffer);
        let blocked = tokio::spawn(async move { writer.produce(2).await });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        buffer.shutdown();
        let result = blocked.await.unwrap();
        assert!(
            matches!(result, Err(QueueError::Shutdown { .. })),
            "producer not woken for {strategy:?}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_consumers_drain_backlog_after_shutdown() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(4, strategy);
        buffer.produce(1).await.unwrap();
        buffer.produce(2).await.unwrap();
        buffer.produce(3).await.unwrap();

        buffer.shutdown();
        assert!(buffer.is_shutdown());

        // Producers fail fast, consumers still see the backlog in order.
        assert!(matches!(
            buffer.produce(4).await,
            Err(QueueError::Shutdown { .. })
        ));
        assert_eq!(buffer.consume().await.unwrap(), 1);
        assert_eq!(buffer.consume().await.unwrap(), 2);
        assert_eq!(buffer.consume().await.unwrap(), 3);
        assert!(matches!(
            buffer.consume().await,
            Err(QueueError::Shutdown { .. })
        ));
    }
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(2, strategy);
        buffer.produce(1).await.unwrap();

        buffer.shutdown();
        buffer.shutdown();
        assert!(buffer.is_shutdown());
        assert_eq!(buffer.consume().await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_try_variants_report_full_and_empty() {
    for strategy in SyncStrategy::ALL {
        let buffer = queue(1, strategy);

        assert!(matches!(buffer.try_consume(), Err(QueueError::Empty)));
        buffer.try_produce(1).unwrap();
        assert!(matches!(
            buffer.try_produce(2),
            Err(QueueError::Full { capacity: 1 })
        ));
        assert_eq!(buffer.try_consume().unwrap(), 1);
    }
}
