use bincode::{
    config,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

/// Trait for records that live at a fixed offset inside one block
/// # Note
/// The legacy configuration writes integers little-endian with fixed width
/// and fixed-size arrays without a length prefix, which reproduces the C
/// struct layout the volume is defined by, padding fields included.
pub trait OnDisk: Encode + Decode<()> {
    /// serialize into the start of `buf`
    /// # Returns
    /// The number of bytes written if successful
    fn encode_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        bincode::encode_into_slice(self, buf, config::legacy())
    }

    /// deserialize from the start of `buf`, trailing bytes are ignored
    fn decode_from(buf: &[u8]) -> Result<Self, DecodeError> {
        bincode::decode_from_slice(buf, config::legacy()).map(|(object, _)| object)
    }
}
