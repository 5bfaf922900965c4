//! legacy exit status codes for system programs.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 66 <br>
/// An input file (not a system file) did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 73 <br>
/// A (user specified) output file cannot be created.
pub const EX_CANTCREAT: i32 = 73;

/// value: 74 <br>
/// An error occurred while doing I/O on some file.
pub const EX_IOERR: i32 = 74;

/// value: 78 <br>
/// Something was found in an unconfigured or misconfigured state.
pub const EX_CONFIG: i32 = 78;
