//! FFI bindings for BetterRest
//!
//! This module provides C-compatible functions so a host app can call the
//! engine directly. Reports are returned as JSON C strings that must be freed
//! by the caller using `rest_free_string`.
//!
//! Estimation failures are not FFI errors: they come back as a normal failure
//! report. NULL is returned only for bad pointers or rejected inputs.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::Local;

use crate::encoder::{BedtimeReport, ReportEncoder};
use crate::error::InputError;
use crate::estimator::BedtimeEstimator;
use crate::model::{BuiltinModel, JsonModelText, ModelLoader};
use crate::pipeline::BedtimeCalculator;
use crate::types::{CaffeineIntake, SleepGoal, WakeTime};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

struct BoundaryInputs {
    wake: WakeTime,
    sleep_goal: SleepGoal,
    caffeine: CaffeineIntake,
}

fn boundary_inputs(
    hour: u32,
    minute: u32,
    sleep_goal: f64,
    caffeine: u32,
) -> Result<BoundaryInputs, InputError> {
    Ok(BoundaryInputs {
        wake: WakeTime::new(hour, minute)?,
        sleep_goal: SleepGoal::new(sleep_goal)?,
        caffeine: CaffeineIntake::new(caffeine)?,
    })
}

/// Calculate for today's date in the local time zone and encode as JSON
fn calculate_today(
    calculator: &BedtimeCalculator,
    hour: u32,
    minute: u32,
    sleep_goal: f64,
    caffeine: u32,
) -> *mut c_char {
    let inputs = match boundary_inputs(hour, minute, sleep_goal, caffeine) {
        Ok(inputs) => inputs,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let report: BedtimeReport = calculator.calculate_on(
        Local::now().date_naive(),
        inputs.wake,
        &Local,
        inputs.sleep_goal,
        inputs.caffeine,
    );

    match ReportEncoder::encode_to_json(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Calculate a bedtime report with the built-in model.
///
/// The wake time is taken on today's local date.
///
/// # Safety
/// - Returns a newly allocated JSON string that must be freed with `rest_free_string`.
/// - Returns NULL if an input is out of range; call `rest_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn rest_calculate_bedtime(
    hour: u32,
    minute: u32,
    sleep_goal: f64,
    caffeine: u32,
) -> *mut c_char {
    clear_last_error();
    let calculator = BedtimeCalculator::new(&BuiltinModel);
    calculate_today(&calculator, hour, minute, sleep_goal, caffeine)
}

// ============================================================================
// Stateful Calculator API
// ============================================================================

/// Opaque handle to a BedtimeCalculator
pub struct RestCalculatorHandle {
    calculator: BedtimeCalculator,
}

/// Create a calculator.
///
/// # Safety
/// - `model_json` is a model document as a null-terminated C string, or NULL
///   for the built-in model.
/// - If the model cannot be loaded a handle is still returned; its reports
///   are failure reports and `rest_last_error` describes the load error.
/// - Must be freed with `rest_calculator_free`.
#[no_mangle]
pub unsafe extern "C" fn rest_calculator_new(model_json: *const c_char) -> *mut RestCalculatorHandle {
    clear_last_error();

    let loaded = match cstr_to_string(model_json) {
        Some(json) => JsonModelText(&json).load(),
        None => BuiltinModel.load(),
    };

    let estimator = match loaded {
        Ok(model) => BedtimeEstimator::with_shared(model),
        Err(e) => {
            set_last_error(&e.to_string());
            BedtimeEstimator::unavailable()
        }
    };

    let calculator = BedtimeCalculator::with_estimator(estimator, ReportEncoder::new());
    Box::into_raw(Box::new(RestCalculatorHandle { calculator }))
}

/// Free a calculator.
///
/// # Safety
/// - `calculator` must be a valid pointer returned by `rest_calculator_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_calculator_free(calculator: *mut RestCalculatorHandle) {
    if !calculator.is_null() {
        drop(Box::from_raw(calculator));
    }
}

/// Returns 1 if the calculator holds a usable model, 0 if not, -1 on NULL.
///
/// # Safety
/// - `calculator` must be a valid pointer returned by `rest_calculator_new`.
#[no_mangle]
pub unsafe extern "C" fn rest_calculator_is_available(
    calculator: *const RestCalculatorHandle,
) -> i32 {
    if calculator.is_null() {
        return -1;
    }
    i32::from((*calculator).calculator.estimator().is_available())
}

/// Calculate a bedtime report with a stateful calculator.
///
/// # Safety
/// - `calculator` must be a valid pointer returned by `rest_calculator_new`.
/// - Returns a newly allocated JSON string that must be freed with `rest_free_string`.
/// - Returns NULL on a NULL handle or out-of-range input; call `rest_last_error`.
#[no_mangle]
pub unsafe extern "C" fn rest_calculator_calculate(
    calculator: *const RestCalculatorHandle,
    hour: u32,
    minute: u32,
    sleep_goal: f64,
    caffeine: u32,
) -> *mut c_char {
    clear_last_error();

    if calculator.is_null() {
        set_last_error("Null calculator pointer");
        return ptr::null_mut();
    }

    let handle = &*calculator;
    calculate_today(&handle.calculator, hour, minute, sleep_goal, caffeine)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by BetterRest functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a BetterRest function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next BetterRest call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn rest_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn rest_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
