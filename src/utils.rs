pub mod path {
    use std::path::Path;

    /// true if `p` names an existing file or directory
    pub fn check_exists(p: impl AsRef<Path>) -> bool {
        p.as_ref().exists()
    }

    #[test]
    fn test_check_exists() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(check_exists(f.path()));
        assert!(!check_exists("/definitely/not/here.vcf"));
    }
}

pub mod error {
    use regex::Regex;
    use snafu::{AsErrorSource, Backtrace, ErrorCompat};

    struct Frame {
        func: String,
        file: String,
        line: u32,
    }

    fn extract_frames(bt: &Backtrace) -> Vec<Frame> {
        let bt_str = format!("{bt:?}");
        let re = match Regex::new(r#"fn: "([^"]+)", file: "([^"]+)", line: (\d+)"#) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };

        re.captures_iter(&bt_str)
            .filter_map(|cap| {
                let func = cap.get(1)?.as_str().to_string();
                let file = cap.get(2)?.as_str().to_string();
                let line = cap.get(3)?.as_str().parse().ok()?;
                Some(Frame { func, file, line })
            })
            .collect()
    }

    /// cause chain of `e`, outermost first
    pub fn error_chain<E>(e: &E) -> Vec<String>
    where
        E: ErrorCompat + AsErrorSource,
    {
        ErrorCompat::iter_chain(e).map(|c| c.to_string()).collect()
    }

    /// print the cause chain of `e` and, if one was captured, the frames of
    /// its backtrace that belong to this crate
    pub fn show_snafu_error<E>(e: E)
    where
        E: ErrorCompat + AsErrorSource,
    {
        for (ic, c) in error_chain(&e).iter().enumerate() {
            if ic == 0 {
                eprintln!("ERROR");
            }
            eprintln!("{ic:>4}: {c}");
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("BACKTRACE");
            let mut iframe = 0;
            for frame in extract_frames(bt) {
                let file = &frame.file;
                let func = &frame.func;
                if file.contains("/rustc/")
                    || file.contains("crates.io")
                    || file.contains("toolchains")
                    || func.contains("as snafu::IntoError")
                {
                    continue;
                }
                eprintln!(
                    "{iframe:>4}: {}\n        {:}:{}",
                    frame.func, frame.file, frame.line
                );
                iframe += 1;
            }
        }
    }

}
