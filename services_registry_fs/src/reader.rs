//! Value reading
//!
//! Most values have a stable size: one query for the size, one for the
//! data. Values directly under the live statistics root are computed by the
//! host on every query, so their size can grow between the two calls. They
//! are read with a growing buffer until a fill succeeds.

use crate::context::MountContext;
use crate::error::FsError;
use crate::oracle;
use log::{debug, trace};
use registry_host::{HostError, HostResult, KeyHandle, ValueType};

/// A value's bytes and type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBuffer {
    pub value_type: ValueType,
    pub data: Vec<u8>,
}

fn read_stable(ctx: &MountContext<'_>, key: KeyHandle, name: &str) -> HostResult<ValueBuffer> {
    let info = ctx.host.query_value(key, name, None, ctx.view)?;
    let mut data = vec![0u8; info.size];
    let filled = ctx.host.query_value(key, name, Some(&mut data), ctx.view)?;
    data.truncate(filled.size);
    Ok(ValueBuffer {
        value_type: filled.value_type,
        data,
    })
}

fn read_live(ctx: &MountContext<'_>, key: KeyHandle, name: &str) -> HostResult<ValueBuffer> {
    let step = ctx.config.live_buffer_step;
    let mut data = vec![0u8; step];
    loop {
        match ctx.host.query_value(key, name, Some(&mut data), ctx.view) {
            Ok(info) => {
                data.truncate(info.size);
                return Ok(ValueBuffer {
                    value_type: info.value_type,
                    data,
                });
            }
            Err(HostError::MoreData { required }) => {
                trace!("live value {:?} needs {} bytes, have {}", name, required, data.len());
                let grown = data.len() + step;
                data.resize(grown, 0);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Reads the value `name` of `key`
///
/// # Errors
///
/// Returns `FsError::IsDirectory` if there is no such value but `key` has a
/// sub-key of that name, and `FsError::NotFound` if there is neither.
pub fn fill_buffer(
    ctx: &MountContext<'_>,
    key: KeyHandle,
    name: &str,
) -> Result<ValueBuffer, FsError> {
    let result = if key == KeyHandle::PERFORMANCE_DATA {
        read_live(ctx, key, name)
    } else {
        read_stable(ctx, key, name)
    };

    match result {
        Ok(buffer) => {
            debug!("read {} bytes from value {:?}", buffer.data.len(), name);
            Ok(buffer)
        }
        Err(HostError::NotFound) => match oracle::scan_subkeys(ctx, key, name) {
            Ok(true) => Err(FsError::IsDirectory(name.to_string())),
            Ok(false) => Err(FsError::NotFound(name.to_string())),
            Err(err) => Err(FsError::Io(err)),
        },
        Err(err) => Err(FsError::from_host(err, name)),
    }
}
