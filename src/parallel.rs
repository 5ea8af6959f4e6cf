//! Multi-threaded keystream application.
//!
//! Counter mode has no chaining between blocks, so a long message splits
//! into contiguous block ranges that scoped worker threads process
//! independently. Each worker refills a small buffer of counter blocks,
//! encrypts it with whatever width its cipher backend offers, and XORs the
//! result into its slice of the message.

use std::thread;

use crate::ctr::{self, Keystream};
use crate::sm4::{Block, BLOCK_LEN};
use crate::{BlockCipher, Result};

/// Counter blocks buffered per refill. Large enough to keep a wide backend
/// saturated, small enough to stay in L1.
const STRIDE_BLOCKS: usize = 64;

/// A reasonable worker count for the current machine.
pub fn available_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// XORs the keystream rooted at `j0` (blocks 1..) into `data` using up to
/// `workers` threads.
pub fn apply_keystream<C>(cipher: &C, j0: Block, data: &mut [u8], workers: usize) -> Result<()>
where
    C: BlockCipher + Sync,
{
    let total_blocks = ctr::required_blocks(data.len())? as usize;
    let keystream = Keystream::new(cipher, j0);

    let workers = workers.max(1);
    if workers == 1 || total_blocks <= STRIDE_BLOCKS {
        xor_range(&keystream, data, 1);
        return Ok(());
    }

    // Contiguous ranges keep each worker's counters sequential.
    let blocks_per = (total_blocks + workers - 1) / workers;
    let chunk_len = blocks_per * BLOCK_LEN;

    log::debug!(
        "fanning {} blocks out to {} workers ({} blocks each)",
        total_blocks,
        workers,
        blocks_per
    );

    thread::scope(|scope| {
        for (i, chunk) in data.chunks_mut(chunk_len).enumerate() {
            let keystream = keystream;
            let first_block = 1 + (i * blocks_per) as u32;
            scope.spawn(move || xor_range(&keystream, chunk, first_block));
        }
    });

    Ok(())
}

/// XORs keystream blocks `first..` into `data`.
///
/// Callers have already bounds-checked the counter range, so the index
/// arithmetic here cannot wrap.
fn xor_range<C: BlockCipher>(keystream: &Keystream<'_, C>, data: &mut [u8], first: u32) {
    let mut buffer = [0u8; STRIDE_BLOCKS * BLOCK_LEN];

    for (s, stride) in data.chunks_mut(STRIDE_BLOCKS * BLOCK_LEN).enumerate() {
        // Per-stride base rather than a running counter: a range ending at
        // the last valid index must not form the index one past it.
        let base = first + (s * STRIDE_BLOCKS) as u32;
        let blocks = (stride.len() + BLOCK_LEN - 1) / BLOCK_LEN;
        let buffer = &mut buffer[..blocks * BLOCK_LEN];

        for (i, counter) in buffer.chunks_exact_mut(BLOCK_LEN).enumerate() {
            counter.copy_from_slice(keystream.counter_block(base + i as u32).as_ref());
        }

        let mut cursor = &mut buffer[..];
        while !cursor.is_empty() {
            let advanced = keystream.cipher().encrypt_blocks(cursor);
            cursor = &mut cursor[advanced..];
        }

        for (byte, k) in stride.iter_mut().zip(buffer.iter()) {
            *byte ^= k;
        }
    }
}
