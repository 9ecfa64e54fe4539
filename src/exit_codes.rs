//! Exit code constants for the joblock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 3: Store failure (the lock store could not be reached or read)
//! - 4: Lock failure (the named lock is not held)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or a refused operation.
pub const USER_ERROR: i32 = 1;

/// Store failure: I/O or connection errors talking to the lock store.
pub const STORE_FAILURE: i32 = 3;

/// Lock failure: the lock named on the command line does not exist.
pub const LOCK_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, STORE_FAILURE, LOCK_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_fit_in_a_byte() {
        for code in [SUCCESS, USER_ERROR, STORE_FAILURE, LOCK_FAILURE] {
            assert!(u8::try_from(code).is_ok());
        }
    }
}
