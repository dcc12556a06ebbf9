use std::path::Path;

use git2::{Oid, Repository, Signature};

pub fn init_repo(dir: &Path) -> Repository {
    Repository::init(dir).unwrap()
}

/// Write a file under the work tree and stage it.
pub fn write_and_stage(repo: &Repository, rel: &str, content: &str) {
    let path = repo.workdir().unwrap().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel)).unwrap();
    index.write().unwrap();
}

pub fn stage_removal(repo: &Repository, rel: &str) {
    std::fs::remove_file(repo.workdir().unwrap().join(rel)).unwrap();
    let mut index = repo.index().unwrap();
    index.remove_path(Path::new(rel)).unwrap();
    index.write().unwrap();
}

pub fn commit(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}
