#[cfg(feature = "wav-output")]
pub mod wav;
