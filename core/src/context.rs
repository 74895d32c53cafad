//! The bridge context and its lifecycle.
//!
//! A [`BiosApi`] owns everything the bridge needs: the memory host, the
//! shadowed image and the scratch buffers. All firmware invocations, trusted
//! or not, go through the one `session` lock.

use core::sync::atomic::{AtomicU32, Ordering};

use spin::Mutex;

use bbapi_abi::index::{BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_UNLOAD};
use bbapi_abi::request::REQUEST_SIZE;
use bbapi_abi::{BIOSAPI_SRVNOTSUPP, CallRequest, RequestDecodeError, RequestLayout};
use bbapi_lib::{Lifecycle, LifecycleFlag, klog_debug, klog_info, klog_warn};
use bbapi_mm::{MemoryHost, UserBytes, UserMemory, copy_bytes_from_user};

use crate::bridge::{self, FirmwareCall};
use crate::config::SearchConfig;
use crate::error::{ArgumentFault, BridgeError, BridgeResult};
use crate::extos;
use crate::gate::{self, Caller, ScratchBuffers};
use crate::platform::{self, DEFAULT_BANNER};
use crate::probe::{self, Capabilities};
use crate::scanner;
use crate::shadow::{FirmwareImage, ImageInfo};

struct Session {
    image: Option<FirmwareImage>,
    scratch: ScratchBuffers,
}

/// One firmware instance and the state around it.
///
/// Every firmware call runs under a single `spin::Mutex` that covers the image
/// and the scratch buffers. A caller that finds it held spins until the call in
/// flight returns, and a firmware call can take milliseconds. Hosts with many
/// threads contending should queue requests before they reach the bridge.
pub struct BiosApi<H: MemoryHost> {
    host: H,
    config: SearchConfig,
    banner: &'static str,
    state: LifecycleFlag,
    capabilities: AtomicU32,
    session: Mutex<Session>,
}

impl<H: MemoryHost> BiosApi<H> {
    pub fn new(host: H, config: SearchConfig) -> Self {
        Self {
            host,
            config,
            banner: DEFAULT_BANNER,
            state: LifecycleFlag::new(),
            capabilities: AtomicU32::new(0),
            session: Mutex::new(Session {
                image: None,
                scratch: ScratchBuffers::new(),
            }),
        }
    }

    /// Text shown on the second front-panel line when a display is found.
    pub fn with_banner(mut self, banner: &'static str) -> Self {
        self.banner = banner;
        self
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> Lifecycle {
        self.state.get()
    }

    /// Feature groups found at startup. Empty until ready.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_bits_truncate(self.capabilities.load(Ordering::Acquire))
    }

    pub fn image_info(&self) -> Option<ImageInfo> {
        self.session.lock().image.as_ref().map(FirmwareImage::info)
    }

    #[inline]
    fn ensure_ready(&self) -> BridgeResult {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(BridgeError::ServiceUnavailable)
        }
    }

    /// Discover and shadow the firmware, then probe it.
    ///
    /// On failure the bridge stays uninitialized and may be started again.
    /// Starting a ready bridge returns its capabilities.
    pub fn start(&self) -> BridgeResult<Capabilities> {
        if !self.state.begin_start() {
            return match self.state.get() {
                Lifecycle::Ready => Ok(self.capabilities()),
                _ => Err(BridgeError::ServiceUnavailable),
            };
        }

        klog_info!(
            "bbapi: searching {:#x} + {:#x}",
            self.config.phys_base,
            self.config.window_len
        );
        let image = match scanner::discover(&self.host, &self.config) {
            Ok(image) => image,
            Err(err) => {
                self.state.abort_start();
                klog_warn!("bbapi: firmware not available: {}", err);
                return Err(err);
            }
        };
        self.session.lock().image = Some(image);
        self.state.finish_start();

        let caps = probe::probe_capabilities(|group, offset| self.raw_status(group, offset));
        self.capabilities.store(caps.bits(), Ordering::Release);

        if caps.supports_display() {
            if let Err(err) = platform::update_display(self, self.banner) {
                klog_warn!("bbapi: display update failed: {}", err);
            }
        }
        extos::announce(self);

        klog_info!("bbapi: ready, capabilities {:?}", caps);
        Ok(caps)
    }

    /// Notify the firmware and release the image. One-way.
    pub fn stop(&self) -> BridgeResult {
        if !self.state.stop() {
            return Err(BridgeError::ServiceUnavailable);
        }

        let mut session = self.session.lock();
        if let Some(image) = session.image.take() {
            let call = FirmwareCall::bare(BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_UNLOAD);
            // SAFETY: the image is live and the lock is held.
            let status = unsafe { bridge::invoke(image.entry(), &call) };
            if status != 0 {
                klog_warn!("bbapi: unload failed with {:#x}", status);
            }
            // SAFETY: the image came from this host and the unload call has
            // returned; holding the lock keeps every other call out.
            unsafe { image.release(&self.host) };
        }
        klog_info!("bbapi: stopped");
        Ok(())
    }

    /// Trusted firmware call on in-process buffers.
    ///
    /// Skips access control and staging. Returns the byte count the firmware
    /// reports, clamped to `output.len()`.
    pub fn call(
        &self,
        group: u32,
        offset: u32,
        input: &[u8],
        output: &mut [u8],
    ) -> BridgeResult<u32> {
        let input_len = u32::try_from(input.len()).map_err(|_| ArgumentFault::InputTooLarge {
            requested: input.len(),
            capacity: u32::MAX as usize,
        })?;
        let output_len = u32::try_from(output.len()).map_err(|_| ArgumentFault::OutputTooLarge {
            requested: output.len(),
            capacity: u32::MAX as usize,
        })?;

        let mut written: u32 = 0;
        let call = FirmwareCall {
            group,
            offset,
            input: if input.is_empty() {
                core::ptr::null()
            } else {
                input.as_ptr()
            },
            input_len,
            output: if output.is_empty() {
                core::ptr::null_mut()
            } else {
                output.as_mut_ptr()
            },
            output_len,
            bytes_written: &mut written,
        };
        let status = self.invoke_locked(&call)?;
        if status != 0 {
            klog_debug!("bbapi: {:#x}:{:#x} failed with {:#x}", group, offset, status);
            return Err(BridgeError::Firmware(status));
        }
        Ok(written.min(output_len))
    }

    #[inline]
    pub fn read(&self, group: u32, offset: u32, output: &mut [u8]) -> BridgeResult<u32> {
        self.call(group, offset, &[], output)
    }

    #[inline]
    pub fn write(&self, group: u32, offset: u32, input: &[u8]) -> BridgeResult {
        self.call(group, offset, input, &mut []).map(|_| ())
    }

    /// Live probe of one group/offset pair.
    pub fn supports(&self, group: u32, offset: u32) -> bool {
        probe::status_indicates_support(self.raw_status(group, offset))
    }

    fn raw_status(&self, group: u32, offset: u32) -> u32 {
        match self.read(group, offset, &mut []) {
            Ok(_) => 0,
            Err(BridgeError::Firmware(status)) => status,
            Err(_) => BIOSAPI_SRVNOTSUPP,
        }
    }

    fn invoke_locked(&self, call: &FirmwareCall) -> BridgeResult<u32> {
        self.ensure_ready()?;
        let session = self.session.lock();
        self.ensure_ready()?;
        let image = session
            .image
            .as_ref()
            .ok_or(BridgeError::ServiceUnavailable)?;
        // SAFETY: the image is live while the lock is held; the pointers in
        // `call` are owned by the caller for the duration of this function.
        Ok(unsafe { bridge::invoke(image.entry(), call) })
    }

    /// Untrusted request whose buffers live in `mem`.
    pub fn submit<M: UserMemory + ?Sized>(
        &self,
        request: &CallRequest,
        mem: &M,
    ) -> BridgeResult<u32> {
        self.submit_as(Caller::Untrusted, request, mem)
    }

    pub fn submit_as<M: UserMemory + ?Sized>(
        &self,
        caller: Caller,
        request: &CallRequest,
        mem: &M,
    ) -> BridgeResult<u32> {
        self.ensure_ready()?;
        gate::validate(request, caller)?;

        let mut session = self.session.lock();
        self.ensure_ready()?;
        let Session { image, scratch } = &mut *session;
        let image = image.as_ref().ok_or(BridgeError::ServiceUnavailable)?;
        gate::dispatch(image.entry(), scratch, request, mem)
    }

    /// Gateway entry: `descriptor` addresses a request descriptor in `mem`.
    ///
    /// Returns 0 on success or a negative error number.
    pub fn handle_request<M: UserMemory + ?Sized>(&self, descriptor: UserBytes, mem: &M) -> i64 {
        let result = self
            .ensure_ready()
            .and_then(|()| read_descriptor(descriptor, mem))
            .and_then(|request| self.submit(&request, mem));
        match result {
            Ok(_) => 0,
            Err(err) => {
                klog_debug!("bbapi: request failed: {}", err);
                err.errno()
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_scratch<R>(&self, f: impl FnOnce(&ScratchBuffers) -> R) -> R {
        f(&self.session.lock().scratch)
    }
}

/// Copy in and decode a descriptor, picking the layout from its length.
pub fn read_descriptor<M: UserMemory + ?Sized>(
    descriptor: UserBytes,
    mem: &M,
) -> BridgeResult<CallRequest> {
    let len = descriptor.len();
    let layout = RequestLayout::for_len(len).ok_or(RequestDecodeError::InvalidLength(len))?;
    let mut raw = [0u8; REQUEST_SIZE];
    let bytes = &mut raw[..layout.size()];
    copy_bytes_from_user(mem, descriptor, bytes)?;
    let (request, _) = CallRequest::decode(bytes)?;
    Ok(request)
}

impl<H: MemoryHost> Drop for BiosApi<H> {
    fn drop(&mut self) {
        if self.state.is_ready() {
            let _ = self.stop();
        }
    }
}
