use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens, then L2-normalise each row.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` of any numeric dtype;
/// the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, time, hidden_dim) = hidden.dims3()?;
    ensure!(
        attention_mask.dims2()? == (batch, time),
        "mask shape {:?} does not match hidden shape {:?}",
        attention_mask.dims(),
        hidden.dims()
    );

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let lengths = (mask.sum_keepdim(1)? + 1e-9)?;
    let mean = summed.broadcast_div(&lengths)?;

    let eps = match hidden.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let out = mean.broadcast_div(&norm)?;
    ensure!(out.dims2()? == (batch, hidden_dim), "pooled shape {:?}", out.dims());
    Ok(out)
}
