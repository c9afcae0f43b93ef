//! Row-sharded iteration helpers.
//!
//! Per-pixel passes are written once against these helpers. With the
//! `parallel` feature they run on the rayon pool, otherwise sequentially.
//! Every output row is a disjoint slice, so no locking is involved, and
//! reductions must be associative and commutative.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Call `f(out_row, in_row)` for each pair of rows.
///
/// `out` is split into rows of `out_stride` elements and `input` into rows
/// of `in_stride` elements.
pub(crate) fn map_rows<O, I, F>(
    out: &mut [O],
    out_stride: usize,
    input: &[I],
    in_stride: usize,
    f: F,
) where
    O: Send,
    I: Sync,
    F: Fn(&mut [O], &[I]) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    out.par_chunks_mut(out_stride)
        .zip(input.par_chunks(in_stride))
        .for_each(|(o, i)| f(o, i));

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(out_stride)
        .zip(input.chunks(in_stride))
        .for_each(|(o, i)| f(o, i));
}

/// Call `f(out_row, a_row, b_row)` for each triple of rows.
pub(crate) fn zip_rows<O, I, F>(
    out: &mut [O],
    out_stride: usize,
    a: &[I],
    b: &[I],
    in_stride: usize,
    f: F,
) where
    O: Send,
    I: Sync,
    F: Fn(&mut [O], &[I], &[I]) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    out.par_chunks_mut(out_stride)
        .zip(a.par_chunks(in_stride))
        .zip(b.par_chunks(in_stride))
        .for_each(|((o, ra), rb)| f(o, ra, rb));

    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(out_stride)
        .zip(a.chunks(in_stride))
        .zip(b.chunks(in_stride))
        .for_each(|((o, ra), rb)| f(o, ra, rb));
}

/// Map each row of `input` to a partial result and combine the partials.
///
/// `combine` must be associative and commutative; `identity` must be its
/// neutral element.
pub(crate) fn reduce_rows<E, T, I, M, R>(
    input: &[E],
    stride: usize,
    identity: I,
    map: M,
    combine: R,
) -> T
where
    E: Sync,
    T: Send,
    I: Fn() -> T + Sync + Send,
    M: Fn(&[E]) -> T + Sync + Send,
    R: Fn(T, T) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    let result = input.par_chunks(stride).map(map).reduce(identity, combine);

    #[cfg(not(feature = "parallel"))]
    let result = input.chunks(stride).map(map).fold(identity(), combine);

    result
}
