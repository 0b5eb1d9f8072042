fn main() {
    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let config = cbindgen::Config::from_file("cbindgen.toml")
        .unwrap_or_default();

    std::fs::create_dir_all(format!("{}/include", crate_dir))
        .expect("Unable to create include directory");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .with_include_guard("IR_GRAPH_H")
        .generate()
        .expect("Unable to generate C bindings")
        .write_to_file(format!("{}/include/ir_graph.h", crate_dir));
}
