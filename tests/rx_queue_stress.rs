//! Producer/consumer stress of the receive queue across real threads: the
//! producer plays the interrupt, the consumer plays the listener task.
use pdm_core::protocol::transport::{
    can_frame::CanFrame,
    can_id::CanId,
    rx_queue::{RxOutcome, RxQueue},
    traits::rx_filter::AcceptAll,
};
use static_cell::StaticCell;

const FRAMES: u32 = 20_000;

fn numbered(seq: u32) -> CanFrame {
    CanFrame::new(CanId::extended(0x0CF0_0400).unwrap(), &seq.to_le_bytes()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
/// The producer retries rejected frames, so every frame arrives exactly once
/// and in order, and every rejection is counted.
async fn test_spsc_fifo_across_threads() {
    static QUEUE: StaticCell<RxQueue<8>> = StaticCell::new();
    let queue: &'static RxQueue<8> = QUEUE.init(RxQueue::new());

    let producer = tokio::spawn(async move {
        let mut rejected = 0u32;
        for seq in 0..FRAMES {
            loop {
                match queue.on_receive(numbered(seq), &AcceptAll) {
                    RxOutcome::Queued => break,
                    RxOutcome::Overflow => {
                        rejected += 1;
                        tokio::task::yield_now().await;
                    }
                    RxOutcome::Filtered => unreachable!("accept-all filter"),
                }
            }
        }
        rejected
    });

    let consumer = tokio::spawn(async move {
        let mut expected = 0u32;
        while expected < FRAMES {
            match queue.pop() {
                Some(frame) => {
                    let seq = u32::from_le_bytes(frame.payload().try_into().unwrap());
                    assert_eq!(seq, expected, "frames must arrive in order");
                    expected += 1;
                }
                None => tokio::task::yield_now().await,
            }
        }
        expected
    });

    let rejected = producer.await.unwrap();
    let received = consumer.await.unwrap();

    assert_eq!(received, FRAMES);
    assert_eq!(queue.overflow_count(), rejected);
    assert!(queue.is_empty());
}
