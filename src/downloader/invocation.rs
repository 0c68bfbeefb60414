// Invocation builder: full yt-dlp argument list for one attempt

use super::format_selector::FormatSelector;
use super::models::{MediaFormat, QualityTier};
use super::profile::EvasionProfile;

/// Conservative network settings handed to yt-dlp itself
pub const SOCKET_TIMEOUT_SECS: u32 = 30;
pub const TOOL_RETRIES: u32 = 3;
pub const FRAGMENT_RETRIES: u32 = 3;

/// Player client requested on the last attempt
pub const ALTERNATE_PLAYER_CLIENT: &str = "youtube:player_client=android";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
    /// `--dump-json` metadata extraction
    Info,
    /// Media download into an output template
    Download {
        format: MediaFormat,
        quality: Option<QualityTier>,
        /// e.g. `/tmp/youtube-fetch/Title_1700000000000_ab12cd34.%(ext)s`
        output_template: String,
    },
}

/// One attempt's worth of invocation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub subcommand: Subcommand,
    pub url: String,
    /// 0-based; selects the network overlay
    pub attempt: u32,
}

impl InvocationSpec {
    pub fn info(url: &str, attempt: u32) -> Self {
        Self {
            subcommand: Subcommand::Info,
            url: url.to_string(),
            attempt,
        }
    }

    /// Attempt-indexed argument overlay.
    ///
    /// Attempt 0 runs on profile defaults, attempt 1 pins IPv4, attempt 2 pins
    /// IPv6 and asks for a different player client.
    pub fn overlay(&self) -> Vec<String> {
        match self.attempt {
            0 => Vec::new(),
            1 => vec!["--force-ipv4".to_string()],
            _ => vec![
                "--force-ipv6".to_string(),
                "--extractor-args".to_string(),
                ALTERNATE_PLAYER_CLIENT.to_string(),
            ],
        }
    }
}

pub struct InvocationBuilder;

impl InvocationBuilder {
    /// Arguments (without the program name) for `spec`, dressed in `profile`.
    ///
    /// Order: mode, evasion, overlay, resilience, format, output, playlist, url.
    pub fn build(spec: &InvocationSpec, profile: &EvasionProfile) -> Vec<String> {
        let mut args = Vec::new();

        if let Subcommand::Info = spec.subcommand {
            args.push("--dump-json".to_string());
            args.push("--no-warnings".to_string());
        } else {
            args.push("--newline".to_string());
            args.push("--no-progress".to_string());
        }

        args.push("--user-agent".to_string());
        args.push(profile.user_agent.clone());
        for (name, value) in &profile.headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }
        args.push("--sleep-requests".to_string());
        args.push(profile.delay_secs.to_string());

        args.extend(spec.overlay());

        args.extend([
            "--socket-timeout".to_string(),
            SOCKET_TIMEOUT_SECS.to_string(),
            "--retries".to_string(),
            TOOL_RETRIES.to_string(),
            "--fragment-retries".to_string(),
            FRAGMENT_RETRIES.to_string(),
        ]);

        if let Subcommand::Download {
            format,
            quality,
            output_template,
        } = &spec.subcommand
        {
            args.extend(FormatSelector::format_args(*format, *quality));
            args.push("-o".to_string());
            args.push(output_template.clone());
        }

        args.push("--no-playlist".to_string());
        args.push(spec.url.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn profile() -> EvasionProfile {
        EvasionProfile::new("test-agent/1.0", 2)
    }

    fn download_spec(attempt: u32) -> InvocationSpec {
        InvocationSpec {
            subcommand: Subcommand::Download {
                format: MediaFormat::Mp4,
                quality: QualityTier::parse("720p").unwrap(),
                output_template: "/tmp/dl/Clip_1_abcd.%(ext)s".to_string(),
            },
            url: URL.to_string(),
            attempt,
        }
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_attempt_zero_has_no_network_family_flag() {
        let args = InvocationBuilder::build(&InvocationSpec::info(URL, 0), &profile());
        assert!(!args.contains(&"--force-ipv4".to_string()));
        assert!(!args.contains(&"--force-ipv6".to_string()));
        assert!(!args.contains(&"--extractor-args".to_string()));
    }

    #[test]
    fn test_attempt_one_forces_ipv4() {
        let args = InvocationBuilder::build(&InvocationSpec::info(URL, 1), &profile());
        assert!(args.contains(&"--force-ipv4".to_string()));
        assert!(!args.contains(&"--force-ipv6".to_string()));
        assert!(!args.contains(&"--extractor-args".to_string()));
    }

    #[test]
    fn test_attempt_two_forces_ipv6_and_alternate_client() {
        let args = InvocationBuilder::build(&InvocationSpec::info(URL, 2), &profile());
        assert!(args.contains(&"--force-ipv6".to_string()));
        assert!(!args.contains(&"--force-ipv4".to_string()));
        assert!(has_pair(&args, "--extractor-args", ALTERNATE_PLAYER_CLIENT));
    }

    #[test]
    fn test_build_is_deterministic_for_fixed_profile() {
        for attempt in 0..3 {
            let spec = download_spec(attempt);
            assert_eq!(
                InvocationBuilder::build(&spec, &profile()),
                InvocationBuilder::build(&spec, &profile())
            );
        }
    }

    #[test]
    fn test_info_args_exact() {
        let args = InvocationBuilder::build(&InvocationSpec::info(URL, 1), &profile());
        let expected: Vec<String> = [
            "--dump-json",
            "--no-warnings",
            "--user-agent",
            "test-agent/1.0",
            "--add-header",
            "Accept-Language:en-US,en;q=0.9",
            "--add-header",
            "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            "--sleep-requests",
            "2",
            "--force-ipv4",
            "--socket-timeout",
            "30",
            "--retries",
            "3",
            "--fragment-retries",
            "3",
            "--no-playlist",
            URL,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_download_args_carry_format_and_template() {
        let args = InvocationBuilder::build(&download_spec(0), &profile());
        assert!(!args.contains(&"--dump-json".to_string()));
        assert!(has_pair(
            &args,
            "-f",
            "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best"
        ));
        assert!(has_pair(&args, "-o", "/tmp/dl/Clip_1_abcd.%(ext)s"));

        // url is last, single-item flag right before it
        let n = args.len();
        assert_eq!(args[n - 1], URL);
        assert_eq!(args[n - 2], "--no-playlist");
    }

    #[test]
    fn test_info_has_no_output_template() {
        let args = InvocationBuilder::build(&InvocationSpec::info(URL, 0), &profile());
        assert!(!args.contains(&"-o".to_string()));
        assert!(!args.contains(&"-f".to_string()));
    }
}
