//! Encryption and password probes.
//!
//! Every probe rewinds the source before returning, whatever the outcome.

use std::io;
use std::io::Read;

use crate::Result;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::formats::FormatReader;
use crate::formats::dispatch;
use crate::io::Source;

/// Bytes read from each entry when only checking that it opens.
const PROBE_LEN: u64 = 8;

/// Returns `true` if some entry of `source` refuses to open without a
/// password.
///
/// Entries flagged as encrypted by their container short-circuit the probe.
/// Other failures, cancellation included, are returned as errors.
pub(crate) fn encrypted(
    name: &str,
    source: &mut dyn Source,
    config: &TraversalConfig,
) -> Result<bool> {
    let probed = rewound(source, |source| {
        let mut extractor = dispatch::identify(name, source, "", config)?;
        extractor.for_each_entry(&mut |meta, content| {
            if config.cancellation().is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }
            if meta.is_dir {
                return Ok(());
            }
            if meta.encrypted {
                return Err(ArchiveError::PasswordRequired);
            }
            content.take(PROBE_LEN).read_to_end(&mut Vec::new())?;
            Ok(())
        })
    });

    match probed {
        Ok(()) => Ok(false),
        Err(err) if err.is_password_error() => {
            log::debug!("{name} is encrypted");
            Ok(true)
        }
        Err(err) => Err(err),
    }
}

/// Opens every entry of `source` with `password` and reads its first bytes.
pub(crate) fn validate(
    name: &str,
    source: &mut dyn Source,
    password: &str,
    config: &TraversalConfig,
) -> Result<()> {
    rewound(source, |source| {
        let mut extractor = dispatch::identify(name, source, password, config)?;
        extractor.for_each_entry(&mut |meta, content| {
            if !meta.is_dir {
                content.take(PROBE_LEN).read_to_end(&mut Vec::new())?;
            }
            Ok(())
        })
    })
}

/// Returns `true` if `password` decrypts every entry of `source`.
///
/// Entries are decoded in full, so integrity checks at the end of encrypted
/// streams are part of the verdict. An empty password never opens.
pub(crate) fn password_opens(
    name: &str,
    source: &mut dyn Source,
    password: &str,
    config: &TraversalConfig,
) -> Result<bool> {
    if password.is_empty() {
        return Ok(false);
    }
    let opened = rewound(source, |source| {
        let mut extractor = dispatch::identify(name, source, password, config)?;
        extractor.for_each_entry(&mut |_, content| {
            io::copy(content, &mut io::sink())?;
            Ok(())
        })
    });

    match opened {
        Ok(()) => Ok(true),
        Err(err) if err.is_password_error() => {
            log::debug!("password for {name} rejected: {err}");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Runs `probe` from the start of `source` and rewinds afterwards. A rewind
/// failure is joined with the probe's own error.
fn rewound<T>(
    source: &mut dyn Source,
    probe: impl FnOnce(&mut dyn Source) -> Result<T>,
) -> Result<T> {
    source.rewind()?;
    let result = probe(&mut *source);
    match (result, source.rewind()) {
        (result, Ok(_)) => result,
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(probe_err), Err(err)) => Err(ArchiveError::join(probe_err, err.into())),
    }
}
