use crate::areas::git::{GitConfig, GitPlumbing};
use crate::areas::workspace::Workspace;
use std::cell::{RefCell, RefMut};
use std::path::Path;
use tracing::debug;

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    workspace: Workspace,
    git: GitPlumbing,
}

impl Repository {
    /// Open the repository containing `path`
    pub async fn discover(
        path: &Path,
        writer: Box<dyn std::io::Write>,
        config: GitConfig,
    ) -> anyhow::Result<Self> {
        let path = GitPlumbing::toplevel(&config, path).await?;
        debug!(root = %path.display(), "repository discovered");

        let workspace = Workspace::new(path.clone().into_boxed_path());
        let git = GitPlumbing::new(config, path.clone().into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            workspace,
            git,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn git(&self) -> &GitPlumbing {
        &self.git
    }
}
