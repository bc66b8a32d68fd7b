// src/auth/gssapi.rs

//! System GSS-API provider (MIT Kerberos or Heimdal) via `libgssapi-sys`.

use std::{ffi::c_void, fmt, ptr::NonNull};

use libgssapi_sys::{
    gss_OID_desc_struct, gss_buffer_desc_struct, gss_canonicalize_name, gss_ctx_id_struct,
    gss_delete_sec_context, gss_display_status, gss_import_name, gss_init_sec_context,
    gss_name_struct, gss_release_buffer, gss_release_name, GSS_C_DELEG_FLAG, GSS_C_GSS_CODE,
    GSS_C_MECH_CODE, GSS_C_MUTUAL_FLAG, GSS_C_NT_HOSTBASED_SERVICE,
};

use super::{InitiatorContext, Mechanism, SecurityProvider};
use crate::error::BoxError;

// GSS_C_DEFAULT lifetime
const DEFAULT_LIFETIME: u32 = 0;

/// The system GSS-API library.
///
/// Credentials are taken from the default credential cache of the calling
/// process (`GSS_C_NO_CREDENTIAL`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Gssapi;

impl SecurityProvider for Gssapi {
    type Name = GssName;
    type Context = GssContext;

    fn host_based_service(&self, service: &str) -> Result<GssName, BoxError> {
        let mut minor = 0;
        let mut buffer = gss_buffer_desc_struct {
            length: service.len(),
            value: service.as_ptr() as *mut c_void,
        };
        let mut name = std::ptr::null_mut::<gss_name_struct>();
        let major = unsafe {
            gss_import_name(&mut minor, &mut buffer, GSS_C_NT_HOSTBASED_SERVICE, &mut name)
        };
        GssError::check(major, minor)?;
        GssName::from_raw(name)
    }

    fn canonicalize(&self, name: &GssName, mech: Mechanism) -> Result<GssName, BoxError> {
        let mut minor = 0;
        let mut oid = oid_desc(mech);
        let mut canonical = std::ptr::null_mut::<gss_name_struct>();
        let major = unsafe { gss_canonicalize_name(&mut minor, name.as_ptr(), &mut oid, &mut canonical) };
        GssError::check(major, minor)?;
        GssName::from_raw(canonical)
    }

    fn create_context(&self, target: GssName, mech: Mechanism) -> Result<GssContext, BoxError> {
        Ok(GssContext {
            ctx: std::ptr::null_mut(),
            target,
            mech,
            flags: 0,
        })
    }
}

fn oid_desc(mech: Mechanism) -> gss_OID_desc_struct {
    let bytes = mech.as_bytes();
    gss_OID_desc_struct {
        length: bytes.len() as u32,
        elements: bytes.as_ptr() as *mut c_void,
    }
}

/// An imported GSS name, released on drop.
#[derive(Debug)]
pub struct GssName(NonNull<gss_name_struct>);

impl GssName {
    fn from_raw(name: *mut gss_name_struct) -> Result<Self, BoxError> {
        NonNull::new(name)
            .map(GssName)
            .ok_or_else(|| "GSS library returned no name".into())
    }

    fn as_ptr(&self) -> *mut gss_name_struct {
        self.0.as_ptr()
    }
}

impl Drop for GssName {
    fn drop(&mut self) {
        let mut _s = 0;
        unsafe { gss_release_name(&mut _s, &mut NonNull::as_ptr(self.0)) };
    }
}

/// A one-shot initiator context, deleted on drop.
#[derive(Debug)]
pub struct GssContext {
    ctx: *mut gss_ctx_id_struct,
    target: GssName,
    mech: Mechanism,
    flags: u32,
}

impl GssContext {
    fn set_flag(&mut self, flag: u32, state: bool) {
        if state {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

impl InitiatorContext for GssContext {
    fn request_mutual_auth(&mut self, state: bool) {
        self.set_flag(GSS_C_MUTUAL_FLAG, state);
    }

    fn request_cred_deleg(&mut self, state: bool) {
        self.set_flag(GSS_C_DELEG_FLAG, state);
    }

    fn init_sec_context(&mut self, input: &[u8]) -> Result<Vec<u8>, BoxError> {
        let mut minor = 0;
        let mut oid = oid_desc(self.mech);
        let mut input_token = gss_buffer_desc_struct {
            length: input.len(),
            value: input.as_ptr() as *mut c_void,
        };
        let mut output_token = gss_buffer_desc_struct {
            length: 0,
            value: std::ptr::null_mut(),
        };
        let major = unsafe {
            gss_init_sec_context(
                &mut minor,
                // GSS_C_NO_CREDENTIAL: use the default credential cache
                std::ptr::null_mut(),
                &mut self.ctx,
                self.target.as_ptr(),
                &mut oid,
                self.flags,
                DEFAULT_LIFETIME,
                std::ptr::null_mut(),
                &mut input_token,
                std::ptr::null_mut(),
                &mut output_token,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        let token = if output_token.value.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(output_token.value as *const u8, output_token.length) }.to_vec()
        };
        let mut _s = 0;
        unsafe { gss_release_buffer(&mut _s, &mut output_token) };
        GssError::check(major, minor)?;
        Ok(token)
    }
}

impl Drop for GssContext {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            let mut _s = 0;
            unsafe { gss_delete_sec_context(&mut _s, &mut self.ctx, std::ptr::null_mut()) };
        }
    }
}

/// A failed GSS-API call, rendered with `gss_display_status`.
#[derive(Clone, Copy, Debug)]
pub struct GssError {
    major: u32,
    minor: u32,
}

impl GssError {
    // calling and routine error bits; the low half only carries supplementary info
    const ERROR_MASK: u32 = 0xffff_0000;

    fn check(major: u32, minor: u32) -> Result<(), GssError> {
        if major & Self::ERROR_MASK != 0 {
            Err(GssError { major, minor })
        } else {
            Ok(())
        }
    }

    /// The major status code.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The mechanism-specific minor status code.
    pub fn minor(&self) -> u32 {
        self.minor
    }
}

impl std::error::Error for GssError {}

impl fmt::Display for GssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_status(self.major, GSS_C_GSS_CODE as i32, f)?;
        if self.minor != 0 {
            f.write_str(": ")?;
            write_status(self.minor, GSS_C_MECH_CODE as i32, f)?;
        }
        Ok(())
    }
}

fn write_status(val: u32, status_type: i32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut more = 0;
    let mut first = true;
    loop {
        let mut minor_status = 0;
        let mut string = gss_buffer_desc_struct {
            length: 0,
            value: std::ptr::null_mut(),
        };
        unsafe {
            gss_display_status(
                &mut minor_status,
                val,
                status_type,
                std::ptr::null_mut(),
                &mut more,
                &mut string,
            )
        };
        if !string.value.is_null() {
            let bytes = unsafe { std::slice::from_raw_parts(string.value as *const u8, string.length) };
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", String::from_utf8_lossy(bytes))?;
            first = false;
        }
        let mut _s = 0;
        unsafe { gss_release_buffer(&mut _s, &mut string) };
        if more == 0 {
            break;
        }
    }
    if first {
        write!(f, "GSS status {val:#010x}")?;
    }
    Ok(())
}
