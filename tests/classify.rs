//! Classification from a downstream crate that glob-imports the module next
//! to derived error types.

use std::io;

use hardstop::classify::*;

#[derive(Debug, PartialEq, thiserror::Error)]
enum CacheError {
    #[error("entry evicted")]
    Evicted,
    #[error("entry corrupt")]
    Corrupt,
}

#[derive(Debug, thiserror::Error)]
#[error("lookup failed")]
struct LookupError {
    #[source]
    source: CacheError,
}

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("lookup")]
    Lookup(#[from] LookupError),
    #[error("disk")]
    Disk(#[from] io::Error),
}

#[test]
fn test_glob_import_with_derived_sources() {
    let error = ServiceError::from(LookupError {
        source: CacheError::Evicted,
    });

    assert!(is(error.as_error(), &CacheError::Evicted));
    assert!(!is(error.as_error(), &CacheError::Corrupt));
    assert_eq!(chain(&error).count(), 3);

    let disk = ServiceError::from(io::Error::from(io::ErrorKind::StorageFull));
    assert!(is(&disk, &kind(io::ErrorKind::StorageFull)));
    assert!(is(&disk, &of::<io::Error>()));
}

#[cfg(not(feature = "remove-asserts"))]
#[test]
fn test_checks_accept_derived_errors() {
    let error = ServiceError::from(LookupError {
        source: CacheError::Corrupt,
    });
    hardstop::assert_err_is(&error, &[&CacheError::Corrupt]);
    hardstop::assert_err_is_not(&error, &[&CacheError::Evicted, &of::<io::Error>()]);
}
