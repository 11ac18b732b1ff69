use crate::error::VersionError;
use crate::version::{bump, next_prerelease, parse_version, BumpLevel};
use semver::Version;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_bump_major() {
    let new = bump(&v("0.20.0-alpha.1"), BumpLevel::Major).unwrap();
    assert_eq!(new.to_string(), "1.0.0");
}

#[test]
fn test_bump_minor() {
    let new = bump(&v("0.20.3-alpha.1"), BumpLevel::Minor).unwrap();
    assert_eq!(new.to_string(), "0.21.0");
}

#[test]
fn test_bump_patch() {
    let new = bump(&v("0.20.0-alpha.1"), BumpLevel::Patch).unwrap();
    assert_eq!(new.to_string(), "0.20.1");
}

#[test]
fn test_bump_clears_build_metadata() {
    let new = bump(&v("1.2.3+build.7"), BumpLevel::Patch).unwrap();
    assert_eq!(new.to_string(), "1.2.4");
}

#[test]
fn test_release_bumps_zero_lower_fields() {
    for input in ["0.0.1", "1.2.3", "4.5.6-rc.2", "10.20.30+meta"] {
        let current = v(input);

        let major = bump(&current, BumpLevel::Major).unwrap();
        assert_eq!((major.minor, major.patch), (0, 0), "{input}");
        assert!(major.pre.is_empty());

        let minor = bump(&current, BumpLevel::Minor).unwrap();
        assert_eq!(minor.major, current.major);
        assert_eq!(minor.patch, 0, "{input}");
        assert!(minor.pre.is_empty());

        let patch = bump(&current, BumpLevel::Patch).unwrap();
        assert_eq!((patch.major, patch.minor), (current.major, current.minor));
        assert!(patch.pre.is_empty());
    }
}

#[test]
fn test_bump_prerelease_initial() {
    let new = bump(&v("0.20.0"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "0.20.0-nightly.1");
}

#[test]
fn test_bump_prerelease_increment() {
    let new = bump(&v("0.20.0-nightly.1"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "0.20.0-nightly.2");
}

#[test]
fn test_bump_prerelease_keeps_existing_channel() {
    let new = bump(&v("0.20.0-beta.3"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "0.20.0-beta.4");

    let new = bump(&v("0.20.0-rc.9.pre"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "0.20.0-rc.10.pre");
}

#[test]
fn test_bump_prerelease_digits_inside_identifier() {
    let new = bump(&v("1.0.0-rc1"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "1.0.0-rc2");

    let new = bump(&v("1.0.0-beta9x"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "1.0.0-beta10x");

    let new = next_prerelease(&v("1.0.0-rc1")).unwrap();
    assert_eq!(new.to_string(), "1.0.0-rc2");
}

#[test]
fn test_bump_prerelease_without_number() {
    let new = bump(&v("0.20.0-alpha"), BumpLevel::Prerelease).unwrap();
    assert_eq!(new.to_string(), "0.20.0-alpha.1");
}

#[test]
fn test_next_prerelease_from_release() {
    let new = next_prerelease(&v("1.2.3")).unwrap();
    assert_eq!(new.to_string(), "1.2.4-nightly.1");
    assert!(new > v("1.2.3"));
}

#[test]
fn test_next_prerelease_from_prerelease() {
    let new = next_prerelease(&v("1.2.4-nightly.1")).unwrap();
    assert_eq!(new.to_string(), "1.2.4-nightly.2");
}

#[test]
fn test_bump_is_deterministic() {
    let current = v("3.1.4-nightly.15");
    for level in [
        BumpLevel::Major,
        BumpLevel::Minor,
        BumpLevel::Patch,
        BumpLevel::Prerelease,
    ] {
        assert_eq!(
            bump(&current, level).unwrap(),
            bump(&current, level).unwrap()
        );
    }
}

#[test]
fn test_parse_version_verbatim() {
    let parsed = parse_version("2.0.0-rc.1+sha.5114f85").unwrap();
    assert_eq!(parsed.to_string(), "2.0.0-rc.1+sha.5114f85");
}

#[test]
fn test_parse_version_rejects_garbage() {
    for input in ["", "1.2", "v1.2.3", "1.2.3.4", "not-a-version"] {
        let err = parse_version(input).unwrap_err();
        assert!(
            matches!(err, VersionError::InvalidVersion { ref version, .. } if version == input),
            "{input}: {err}"
        );
    }
}

#[test]
fn test_parse_version_rejects_surrounding_whitespace() {
    for input in [" 1.2.3", "1.2.3 ", "\t1.2.3\n"] {
        assert!(matches!(
            parse_version(input),
            Err(VersionError::InvalidVersion { .. })
        ));
    }
}
