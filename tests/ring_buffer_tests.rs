//! Ring Buffer Tests
//!
//! Tests for the SPSC byte ring behind the host link's RX and TX queues.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test ring_buffer_tests

use modem_firmware::serial::RingBuffer;

// =============================================================================
// Capacity
// =============================================================================

#[test]
fn one_slot_is_reserved() {
    let mut ring = RingBuffer::<8>::new();
    assert_eq!(RingBuffer::<8>::CAPACITY, 7);
    for i in 0..7 {
        assert!(ring.try_push(i));
    }
    assert!(ring.is_full());
    assert!(!ring.try_push(99));
    assert_eq!(ring.len(), 7);
    assert_eq!(ring.free(), 0);
}

#[test]
fn len_plus_free_is_capacity() {
    let mut ring = RingBuffer::<16>::new();
    for round in 0..40u8 {
        ring.try_push(round);
        if round % 3 == 0 {
            ring.try_pop();
        }
        assert_eq!(ring.len() + ring.free(), 15);
    }
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn fifo_across_many_wraps() {
    let mut ring = RingBuffer::<5>::new();
    let mut expected = 0u8;
    let mut next = 0u8;
    for _ in 0..100 {
        while ring.try_push(next) {
            next = next.wrapping_add(1);
        }
        for _ in 0..3 {
            assert_eq!(ring.try_pop(), Some(expected));
            expected = expected.wrapping_add(1);
        }
    }
}

#[test]
fn block_push_truncates_to_free_space() {
    let mut ring = RingBuffer::<8>::new();
    assert_eq!(ring.try_push_block(b"abcdefghij"), 7);
    let mut out = [0u8; 7];
    assert!(ring.try_pop_block(&mut out));
    assert_eq!(&out, b"abcdefg");
}

#[test]
fn block_pop_is_all_or_nothing() {
    let mut ring = RingBuffer::<8>::new();
    ring.try_push_block(b"abc");
    let mut out = [0u8; 4];
    assert!(!ring.try_pop_block(&mut out));
    assert_eq!(ring.len(), 3);
    let mut out = [0u8; 3];
    assert!(ring.try_pop_block(&mut out));
    assert!(ring.is_empty());
}

#[test]
fn block_ops_split_at_the_end() {
    let mut ring = RingBuffer::<8>::new();
    ring.try_push_block(b"123456");
    let mut skip = [0u8; 5];
    ring.try_pop_block(&mut skip);
    // insert index is at 6, so this block straddles the end
    assert_eq!(ring.try_push_block(b"wxyz"), 4);
    let mut out = [0u8; 5];
    assert!(ring.try_pop_block(&mut out));
    assert_eq!(&out, b"6wxyz");
}

#[test]
fn empty_block_is_noop() {
    let mut ring = RingBuffer::<4>::new();
    assert_eq!(ring.try_push_block(&[]), 0);
    assert!(ring.try_pop_block(&mut []));
    assert!(ring.is_empty());
}

// =============================================================================
// Peek and clear
// =============================================================================

#[test]
fn peek_does_not_consume() {
    let mut ring = RingBuffer::<8>::new();
    ring.try_push_block(b"xy");
    assert_eq!(ring.peek(0), Some(b'x'));
    assert_eq!(ring.peek(1), Some(b'y'));
    assert_eq!(ring.peek(2), None);
    assert_eq!(ring.len(), 2);
}

#[test]
fn holds_exactly_matches_whole_contents() {
    let mut ring = RingBuffer::<8>::new();
    ring.try_push_block(b"up");
    assert!(ring.holds_exactly(b"up"));
    assert!(!ring.holds_exactly(b"u"));
    ring.try_push(b'!');
    assert!(!ring.holds_exactly(b"up"));
}

#[test]
fn clear_discards_pending() {
    let mut ring = RingBuffer::<8>::new();
    ring.try_push_block(b"junk");
    ring.clear();
    assert!(ring.is_empty());
    assert!(ring.try_push(b'a'));
    assert_eq!(ring.try_pop(), Some(b'a'));
}
