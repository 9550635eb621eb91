use bitflags::bitflags;

bitflags! {
    /// Pipeline resources a main-pass shader asks for. The renderer only
    /// binds (and only requires layouts for) what a shader declares, so
    /// shaders that ignore lighting skip the lighting bind group entirely.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ShaderInputs: u32 {
        const SCENE_LIGHTS = 1 << 0;
        const SPOT_SHADOWMAPS = 1 << 1;
        const SUN_SHADOWMAPS = 1 << 2;
        const IN_NORMAL_DEPTH = 1 << 3;
        const IN_ID = 1 << 4;
    }
}

impl ShaderInputs {
    /// Whether the shader binds the lighting group (lights block, shadow
    /// arrays, comparison sampler). The three flags share one group, so any
    /// of them pulls the whole group in.
    pub fn wants_lights_group(self) -> bool {
        self.intersects(Self::SCENE_LIGHTS | Self::SPOT_SHADOWMAPS | Self::SUN_SHADOWMAPS)
    }

    /// Whether the shader binds the prepass group (normal/depth and ID
    /// textures from the prepass).
    pub fn wants_prepass_group(self) -> bool {
        self.intersects(Self::IN_NORMAL_DEPTH | Self::IN_ID)
    }

    /// Bind group index of the lighting group, when present.
    pub fn lights_group_index(self) -> Option<u32> {
        self.wants_lights_group().then_some(2)
    }

    /// Bind group index of the prepass group, when present. Groups are packed
    /// contiguously, so it slides down when the lighting group is absent.
    pub fn prepass_group_index(self) -> Option<u32> {
        self.wants_prepass_group()
            .then(|| if self.wants_lights_group() { 3 } else { 2 })
    }
}

/// A compiled main-pass shader plus the inputs it declared at compile time.
pub struct ObjectShader {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) inputs: ShaderInputs,
}

impl ObjectShader {
    pub fn inputs(&self) -> ShaderInputs {
        self.inputs
    }
}

/// Cel-shaded diffuse with cascaded sun shadows and spot shadows, the
/// reference material for lit scenes.
pub const NPR_DIFFUSE_SOURCE: &str = include_str!("../shader/npr_diffuse.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowmap_inputs_pull_in_the_lights_group() {
        assert!(ShaderInputs::SPOT_SHADOWMAPS.wants_lights_group());
        assert!(ShaderInputs::SUN_SHADOWMAPS.wants_lights_group());
        assert!(!ShaderInputs::IN_ID.wants_lights_group());
    }

    #[test]
    fn prepass_group_index_packs_after_the_lights_group() {
        let lit = ShaderInputs::SCENE_LIGHTS | ShaderInputs::IN_ID;
        assert_eq!(lit.lights_group_index(), Some(2));
        assert_eq!(lit.prepass_group_index(), Some(3));

        let unlit = ShaderInputs::IN_NORMAL_DEPTH;
        assert_eq!(unlit.lights_group_index(), None);
        assert_eq!(unlit.prepass_group_index(), Some(2));

        assert_eq!(ShaderInputs::empty().prepass_group_index(), None);
    }
}
