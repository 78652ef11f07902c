// Input decoders for plain and compressed CSV files

use crate::core::constants::InputCompression;
use crate::core::error::{Result, ViewerError};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub type InputStream = Box<dyn Read>;

/// Opens `path` and wraps it in the decoder its extension asks for.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<InputStream> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    decoder_for(file, InputCompression::from_path(path))
}

pub fn decoder_for<R: Read + 'static>(
    source: R,
    compression: InputCompression,
) -> Result<InputStream> {
    match compression {
        InputCompression::None => Ok(Box::new(source)),

        InputCompression::Gzip => Ok(Box::new(GzDecoder::new(source))),

        #[cfg(feature = "lz4")]
        InputCompression::Lz4 => {
            let decoder = lz4::Decoder::new(source)?;
            Ok(Box::new(decoder))
        }

        #[cfg(not(feature = "lz4"))]
        InputCompression::Lz4 => {
            Err(ViewerError::UnsupportedCompression("lz4 feature disabled".to_string()))
        }

        #[cfg(feature = "zstd")]
        InputCompression::Zstd => {
            let decoder = zstd::stream::read::Decoder::new(source).map_err(ViewerError::Io)?;
            Ok(Box::new(decoder))
        }

        #[cfg(not(feature = "zstd"))]
        InputCompression::Zstd => {
            Err(ViewerError::UnsupportedCompression("zstd feature disabled".to_string()))
        }
    }
}
