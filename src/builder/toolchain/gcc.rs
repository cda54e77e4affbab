//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use super::{CommandSpec, CompileInput, HostPlatform, Language, LinkInput, Toolchain};

/// GCC/Clang toolchain (Unix-like systems, MinGW).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Path to the C++ compiler
    pub cxx: PathBuf,
    /// Compiler family (gcc or clang)
    pub family: HostPlatform,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(cc: PathBuf, cxx: PathBuf, family: HostPlatform) -> Self {
        GccToolchain { cc, cxx, family }
    }

    /// Infer C++ compiler path from C compiler path.
    ///
    /// Handles common patterns:
    /// - gcc, x86_64-linux-gnu-gcc -> g++, x86_64-linux-gnu-g++
    /// - clang -> clang++
    /// - cc, /usr/bin/cc -> c++, /usr/bin/c++
    pub fn infer_cxx(cc: &Path) -> PathBuf {
        let cc_str = cc.to_string_lossy();

        if cc_str.ends_with("gcc") {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 2]));
        }

        if cc_str.ends_with("clang") {
            return PathBuf::from(format!("{}++", cc_str));
        }

        // Only match "cc" when it's a complete basename (not "mycc")
        let is_standalone_cc = cc_str == "cc"
            || cc_str.ends_with("/cc")
            || cc_str.ends_with("\\cc")
            || cc_str.ends_with("-cc");

        if is_standalone_cc {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 1]));
        }

        PathBuf::from(format!("{}++", cc_str))
    }
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> HostPlatform {
        self.family
    }

    fn compiler_path(&self) -> &Path {
        &self.cc
    }

    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec {
        // The language-mode decision is the driver choice; the C++ driver is
        // selected only for C++ units.
        let compiler = match lang {
            Language::C => &self.cc,
            Language::Cxx => &self.cxx,
        };

        let mut cmd = CommandSpec::new(compiler);

        cmd = cmd.arg("-c");

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        for (name, value) in &input.defines {
            match value {
                Some(v) => cmd = cmd.arg(format!("-D{}={}", name, v)),
                None => cmd = cmd.arg(format!("-D{}", name)),
            }
        }

        cmd = cmd.args(input.cflags.iter().cloned());

        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        cmd
    }

    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cc);

        cmd = cmd.arg("-shared");

        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        for lib in &input.libs {
            cmd = cmd.arg(format!("-l{}", lib));
        }

        for sym in &input.exports {
            cmd = cmd.arg(format!("-Wl,--export-dynamic-symbol={}", sym));
        }

        // PE targets only (MinGW); ld ignores the request elsewhere
        if let Some(ref implib) = input.implib {
            cmd = cmd.arg(format!("-Wl,--out-implib,{}", implib.display()));
        }

        cmd = cmd.args(input.ldflags.iter().cloned());

        cmd
    }

    fn object_extension(&self) -> &str {
        "o"
    }

    fn shared_lib_extension(&self) -> &str {
        if cfg!(target_os = "macos") {
            "dylib"
        } else {
            "so"
        }
    }

    fn import_lib_extension(&self) -> &str {
        "dll.a"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> GccToolchain {
        GccToolchain::new(
            PathBuf::from("gcc"),
            PathBuf::from("g++"),
            HostPlatform::Gcc,
        )
    }

    #[test]
    fn test_compile_command_c() {
        let input = CompileInput {
            source: PathBuf::from("src/funclib.c"),
            output: PathBuf::from("build/funclib.o"),
            include_dirs: vec![PathBuf::from("/usr/include")],
            defines: vec![("NDEBUG".to_string(), None)],
            cflags: vec!["-O2".to_string()],
        };

        let cmd = toolchain().compile_command(&input, Language::C);
        assert_eq!(cmd.program, PathBuf::from("gcc"));
        assert!(cmd.args.contains(&"-c".to_string()));
        assert!(cmd.args.contains(&"-I/usr/include".to_string()));
        assert!(cmd.args.contains(&"-DNDEBUG".to_string()));
        assert!(cmd.args.contains(&"-O2".to_string()));
    }

    #[test]
    fn test_compile_command_cxx_selects_cxx_driver() {
        let input = CompileInput {
            source: PathBuf::from("src/funclib.cpp"),
            output: PathBuf::from("build/funclib.o"),
            ..Default::default()
        };

        let cmd = toolchain().compile_command(&input, Language::Cxx);
        assert_eq!(cmd.program, PathBuf::from("g++"));
    }

    #[test]
    fn test_link_command_exports_and_implib() {
        let input = LinkInput {
            objects: vec![PathBuf::from("build/a.o")],
            output: PathBuf::from("out/mod.so"),
            libs: vec!["cudart".to_string()],
            exports: vec!["initmod".to_string()],
            implib: Some(PathBuf::from("build/mod.dll.a")),
            ..Default::default()
        };

        let cmd = toolchain().link_shared_command(&input);
        assert!(cmd.args.contains(&"-shared".to_string()));
        assert!(cmd.args.contains(&"-lcudart".to_string()));
        assert!(cmd
            .args
            .contains(&"-Wl,--export-dynamic-symbol=initmod".to_string()));
        assert!(cmd
            .args
            .iter()
            .any(|a| a.starts_with("-Wl,--out-implib,")));
    }

    #[test]
    fn test_infer_cxx() {
        assert_eq!(
            GccToolchain::infer_cxx(Path::new("/usr/bin/gcc")),
            PathBuf::from("/usr/bin/g++")
        );
        assert_eq!(
            GccToolchain::infer_cxx(Path::new("clang")),
            PathBuf::from("clang++")
        );
        assert_eq!(
            GccToolchain::infer_cxx(Path::new("/usr/bin/cc")),
            PathBuf::from("/usr/bin/c++")
        );
    }
}
