use log::warn;

/// Asset-name fragment identifying builds for the running OS and CPU, for
/// example `linux-x64` or `darwin-arm64`.
#[must_use]
pub fn platform_pattern() -> String {
    pattern_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Map an OS/architecture pair (as reported by [`std::env::consts`]) to the
/// pattern release assets are named with.
///
/// Unknown operating systems yield their raw `<os>-<arch>` identifier so a
/// matching asset can still be found if the release happens to publish one.
#[must_use]
pub fn pattern_for(os: &str, arch: &str) -> String {
    match os {
        "windows" => {
            if is_64_bit(arch) {
                "windows-x64".to_string()
            } else {
                "windows-x86".to_string()
            }
        }
        "macos" => {
            if arch == "aarch64" {
                "darwin-arm64".to_string()
            } else {
                "darwin-x64".to_string()
            }
        }
        "linux" => {
            if arch == "aarch64" {
                "linux-arm64".to_string()
            } else {
                "linux-x64".to_string()
            }
        }
        _ => {
            let identifier = format!("{os}-{}", arch_label(arch));
            warn!("Unknown platform, using runtime identifier: {identifier}");
            identifier
        }
    }
}

fn is_64_bit(arch: &str) -> bool {
    matches!(arch, "x86_64" | "aarch64")
}

fn arch_label(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}
