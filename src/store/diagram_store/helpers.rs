// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn check_cancelled(cancel: &CancellationToken) -> Result<(), SessionError> {
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }
    Ok(())
}

/// Runs an engine call, turning a panic into its message.
fn contain<T>(call: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic with non-string payload".to_owned()
        }
    })
}

/// [`contain`] for editor calls: a panic becomes [`EngineError::Faulted`].
fn guarded<T>(call: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    contain(call).unwrap_or_else(|fault| Err(EngineError::Faulted(fault)))
}

/// Ids present in `before` but gone from `after`, each mapped to `""`.
///
/// Edge ids are counted, so dropping one of two parallel `a->b` edges still reports `a->b`.
fn removed_ids(before: &Graph, after: &Graph) -> IdDeltas {
    let edge_counts = |graph: &Graph| {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for index in 0..graph.edges().len() {
            if let Some(id) = graph.edge_public_id(index) {
                *counts.entry(id).or_default() += 1;
            }
        }
        counts
    };

    let remaining = edge_counts(after);
    let mut deltas: IdDeltas = edge_counts(before)
        .into_iter()
        .filter(|(id, count)| remaining.get(id).copied().unwrap_or(0) < *count)
        .map(|(id, _)| (id, String::new()))
        .collect();
    deltas.extend(
        before
            .objects()
            .filter(|object| !after.contains_object(object.id()))
            .map(|object| (object.id().to_owned(), String::new())),
    );
    deltas
}

/// Writes through a temporary sibling file and renames it into place.
fn write_output(path: &Path, contents: &[u8]) -> Result<(), SessionError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SessionError::Io { path, source }
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let Some(file_name) = path.file_name() else {
        return Err(SessionError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(".trellis.tmp.{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(io_err(&tmp_path))?;
    file.write_all(contents).map_err(io_err(&tmp_path))?;
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SessionError::Io { path: path.to_path_buf(), source });
    }
    Ok(())
}
