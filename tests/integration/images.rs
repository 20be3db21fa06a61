//! Listings assembled once, saved as images, and run from the image.

use std::fs;

use nixvm::language::{Vm, VmConfig, assemble_strict};
use nixvm::runtime::{load_program, serialize};

const GREETING: &str = "
  str \"hello, \"
  str \"world\"
  concat
  println
  int 3
  alloc double
  println
";

#[test]
fn image_runs_like_its_listing() {
    let program = assemble_strict(GREETING).unwrap();

    let mut from_listing = Vm::capturing(VmConfig::default());
    from_listing.run(&program).unwrap();

    let path = std::env::temp_dir().join(format!("nixvm_it_{}.nixb", std::process::id()));
    serialize::save_to_file(&program, &path).unwrap();
    let loaded = load_program(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(loaded, program);

    let mut from_image = Vm::capturing(VmConfig::default());
    from_image.run(&loaded).unwrap();
    assert_eq!(from_image.output(), from_listing.output());
    assert_eq!(
        from_image.output(),
        "hello, world\n[0.000000, 0.000000, 0.000000]\n"
    );
}

#[test]
fn listing_files_are_assembled() {
    let path = std::env::temp_dir().join(format!("nixvm_it_{}.nix", std::process::id()));
    fs::write(&path, GREETING).unwrap();
    let program = load_program(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(program, assemble_strict(GREETING).unwrap());
}
