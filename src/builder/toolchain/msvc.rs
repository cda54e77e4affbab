//! MSVC toolchain implementation.

use std::path::{Path, PathBuf};

use super::{CommandSpec, CompileInput, HostPlatform, Language, LinkInput, Toolchain};

/// MSVC toolchain (Windows).
#[derive(Debug, Clone)]
pub struct MsvcToolchain {
    /// Path to cl.exe (compiler)
    pub cl: PathBuf,
    /// Path to link.exe (linker)
    pub link: PathBuf,
}

impl MsvcToolchain {
    /// Create a new MSVC toolchain.
    pub fn new(cl: PathBuf, link: PathBuf) -> Self {
        MsvcToolchain { cl, link }
    }
}

impl Toolchain for MsvcToolchain {
    fn platform(&self) -> HostPlatform {
        HostPlatform::Msvc
    }

    fn compiler_path(&self) -> &Path {
        // cl.exe compiles both C and C++
        &self.cl
    }

    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cl);

        cmd = cmd.arg("/nologo");
        cmd = cmd.arg("/c");

        // Language-mode flag only for C++ units; /TP on a plain C file would
        // change its semantics.
        if lang == Language::Cxx {
            cmd = cmd.arg("/TP");
        }

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("/I{}", dir.display()));
        }

        for (name, value) in &input.defines {
            match value {
                Some(v) => cmd = cmd.arg(format!("/D{}={}", name, v)),
                None => cmd = cmd.arg(format!("/D{}", name)),
            }
        }

        cmd = cmd.args(input.cflags.iter().cloned());

        cmd = cmd.arg(input.source.display().to_string());

        cmd = cmd.arg(format!("/Fo{}", input.output.display()));

        cmd
    }

    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.link);

        cmd = cmd.arg("/nologo");
        cmd = cmd.arg("/DLL");
        cmd = cmd.arg(format!("/OUT:{}", input.output.display()));

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("/LIBPATH:{}", dir.display()));
        }

        for lib in &input.libs {
            cmd = cmd.arg(format!("{}.lib", lib));
        }

        for sym in &input.exports {
            cmd = cmd.arg(format!("/EXPORT:{}", sym));
        }

        if let Some(ref implib) = input.implib {
            cmd = cmd.arg(format!("/IMPLIB:{}", implib.display()));
        }

        cmd = cmd.args(input.ldflags.iter().cloned());

        cmd
    }

    fn object_extension(&self) -> &str {
        "obj"
    }

    fn shared_lib_extension(&self) -> &str {
        "pyd"
    }

    fn import_lib_extension(&self) -> &str {
        "lib"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> MsvcToolchain {
        MsvcToolchain::new(PathBuf::from("cl"), PathBuf::from("link"))
    }

    #[test]
    fn test_compile_command_c_has_no_language_flag() {
        let input = CompileInput {
            source: PathBuf::from("src/funclib.c"),
            output: PathBuf::from("build/funclib.obj"),
            include_dirs: vec![PathBuf::from("C:/include")],
            ..Default::default()
        };

        let cmd = toolchain().compile_command(&input, Language::C);
        assert_eq!(cmd.program, PathBuf::from("cl"));
        assert!(cmd.args.contains(&"/c".to_string()));
        assert!(!cmd.args.contains(&"/TP".to_string()));
        assert!(cmd.args.iter().any(|a| a.starts_with("/I")));
        assert!(cmd.args.iter().any(|a| a.starts_with("/Fo")));
    }

    #[test]
    fn test_compile_command_cxx_forces_cpp_mode() {
        let input = CompileInput {
            source: PathBuf::from("src/funclib.cpp"),
            output: PathBuf::from("build/funclib.obj"),
            ..Default::default()
        };

        let cmd = toolchain().compile_command(&input, Language::Cxx);
        assert!(cmd.args.contains(&"/TP".to_string()));
    }

    #[test]
    fn test_link_command_exports_and_implib() {
        let input = LinkInput {
            objects: vec![PathBuf::from("build/a.obj")],
            output: PathBuf::from("out/mod.pyd"),
            lib_dirs: vec![PathBuf::from("C:/cuda/lib/x64")],
            libs: vec!["cudart".to_string()],
            exports: vec!["initmod".to_string()],
            implib: Some(PathBuf::from("build/mod.lib")),
            ..Default::default()
        };

        let cmd = toolchain().link_shared_command(&input);
        assert!(cmd.args.contains(&"/DLL".to_string()));
        assert!(cmd.args.contains(&"cudart.lib".to_string()));
        assert!(cmd.args.contains(&"/EXPORT:initmod".to_string()));
        assert!(cmd.args.iter().any(|a| a.starts_with("/IMPLIB:")));
        assert!(cmd
            .args
            .iter()
            .any(|a| a.starts_with("/LIBPATH:")));
    }
}
