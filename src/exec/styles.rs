// src/exec/styles.rs

//! Sass/SCSS compilation through `grass`.
//!
//! Every non-partial source is compiled on its own and written below `dest`
//! as `<stem><suffix>.css`, keeping its path relative to the glob base.
//! Output is compressed in production and expanded in development. Each
//! written stylesheet is announced to the reload hub so open pages swap it
//! in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream;
use grass::{InputSyntax, Options, OutputStyle};
use tracing::debug;

use crate::engine::{Artifact, Completion, TaskContext};
use crate::errors::TaskError;
use crate::exec::sources::{SourceFile, collect_sources, display_relative, renamed};
use crate::fs::FileSystem;
use crate::types::Environment;

/// Resolved `styles` task settings.
#[derive(Debug, Clone)]
pub struct StylesJob {
    pub root: PathBuf,
    pub src: Vec<String>,
    pub dest: PathBuf,
    pub suffix: String,
}

pub fn styles_task(
    job: StylesJob,
    fs: Arc<dyn FileSystem>,
) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    let job = Arc::new(job);
    move |ctx: TaskContext| {
        let sources = match collect_sources(fs.as_ref(), &job.root, &job.src) {
            Ok(sources) => sources,
            Err(err) => return Completion::from_result(Err(TaskError::Other(err))),
        };

        let job = Arc::clone(&job);
        let fs = Arc::clone(&fs);
        let compiled = sources
            .into_iter()
            .filter(|source| !source.is_partial())
            .map(move |source| compile_one(&job, fs.as_ref(), &ctx, &source));

        Completion::stream(stream::iter(compiled))
    }
}

fn output_style(env: Environment) -> OutputStyle {
    if env.is_production() {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    }
}

fn input_syntax(path: &Path) -> InputSyntax {
    match path.extension().and_then(|e| e.to_str()) {
        Some("sass") => InputSyntax::Sass,
        Some("css") => InputSyntax::Css,
        _ => InputSyntax::Scss,
    }
}

/// Compile `input` as the stylesheet at `path`. Imports resolve relative to
/// the file's directory.
pub fn compile(path: &Path, input: String, env: Environment) -> Result<String, TaskError> {
    let load_dir = path.parent().unwrap_or(Path::new("."));
    let options = Options::default()
        .style(output_style(env))
        .input_syntax(input_syntax(path))
        .load_path(load_dir);

    grass::from_string(input, &options).map_err(|err| TaskError::Transform {
        collaborator: "sass",
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn compile_one(
    job: &StylesJob,
    fs: &dyn FileSystem,
    ctx: &TaskContext,
    source: &SourceFile,
) -> Result<Artifact, TaskError> {
    let input = fs
        .read_to_string(&source.path)
        .map_err(|err| TaskError::io(&source.path, err))?;

    let css = compile(&source.path, input, ctx.environment())?;

    let out = job
        .root
        .join(&job.dest)
        .join(renamed(&source.relative, &job.suffix, "css"));
    fs.write(&out, css.as_bytes())
        .map_err(|err| TaskError::io(&out, err))?;

    debug!(src = %source.path.display(), out = %out.display(), "compiled stylesheet");
    ctx.reload()
        .notify_style_update(Path::new(&display_relative(&job.root, &out)));

    Ok(Artifact::new(out))
}
