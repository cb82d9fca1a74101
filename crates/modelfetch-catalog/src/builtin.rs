//! Pretrained weights shipped with the EVA3D renderer.

use modelfetch_verify::Checksum;

use crate::{Catalog, FileSpec, Result};

pub const EVA3D_DEEPFASHION: &str = "eva3d-deepfashion";
pub const SMPL: &str = "smpl";

/// The default catalog, in download order.
pub fn builtin() -> Result<Catalog> {
    let eva3d = FileSpec::new(
        "https://drive.google.com/uc?id=1SYPjxnHz3XPRhTarx_Lw8SG_iz16QUMU",
        "checkpoint/512x256_deepfashion/volume_renderer/models_0420000.pt",
    )
    .expected_size(160_393_221)
    .expected_checksum(checksum(EVA3D_DEEPFASHION, "d0fae86edf76c52e94223bd3f39b2157")?);

    let smpl = FileSpec::new(
        "https://drive.google.com/uc?id=15XKYibakFcDgs_wEtLqS5dJYHck0FIv4",
        "smpl_models/smpl/SMPL_NEUTRAL.pkl",
    )
    .expected_size(39_001_280)
    .expected_checksum(checksum(SMPL, "65dc7f162f3ef21a38637663c57e14a7")?);

    Catalog::new([(EVA3D_DEEPFASHION, eva3d), (SMPL, smpl)])
}

fn checksum(name: &str, hex: &str) -> Result<Checksum> {
    Checksum::md5(hex).map_err(|source| crate::CatalogError::InvalidChecksum {
        name: name.to_string(),
        source,
    })
}
