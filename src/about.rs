pub const LABSIM_DISPLAY_VERSION: &str = env!("LABSIM_DISPLAY_VERSION");
pub const LABSIM_BUILD_N: &str = env!("LABSIM_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "LabSim {}\nBuild {}\nEducational molecular biology wet-lab simulator",
        LABSIM_DISPLAY_VERSION, LABSIM_BUILD_N
    )
}
