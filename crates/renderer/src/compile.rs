use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("slide vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the displacement transition fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("slide transition fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

pub(crate) fn vertex_source() -> String {
    format!("#version 450\n{UNIFORM_BLOCK}{VERTEX_BODY}")
}

pub(crate) fn fragment_source() -> String {
    format!("#version 450\n{UNIFORM_BLOCK}{SAMPLERS}{FRAGMENT_BODY}")
}

/// Uniform block shared by both stages.
///
/// The layout must match [`SlideUniforms`](crate::gpu::uniforms::SlideUniforms). Members
/// carry a leading underscore so the macros can expose the conventional names
/// without clashing with the block fields.
const UNIFORM_BLOCK: &str = r"
layout(std140, set = 0, binding = 0) uniform SlideParams {
    mat4 _uMVMatrix;
    mat4 _uPMatrix;
    mat4 _activeTextureMatrix;
    mat4 _nextTextureMatrix;
    float _uTransitionTimer;
} ubo;

#define uMVMatrix ubo._uMVMatrix
#define uPMatrix ubo._uPMatrix
#define activeTextureMatrix ubo._activeTextureMatrix
#define nextTextureMatrix ubo._nextTextureMatrix
#define uTransitionTimer ubo._uTransitionTimer
";

/// Texture/sampler pairs in slot order: displacement, active, next.
const SAMPLERS: &str = r"
layout(set = 1, binding = 0) uniform texture2D slidewall_displacement_texture;
layout(set = 1, binding = 1) uniform sampler slidewall_displacement_sampler;
layout(set = 1, binding = 2) uniform texture2D slidewall_active_texture;
layout(set = 1, binding = 3) uniform sampler slidewall_active_sampler;
layout(set = 1, binding = 4) uniform texture2D slidewall_next_texture;
layout(set = 1, binding = 5) uniform sampler slidewall_next_sampler;

#define displacement sampler2D(slidewall_displacement_texture, slidewall_displacement_sampler)
#define activeTexture sampler2D(slidewall_active_texture, slidewall_active_sampler)
#define nextTexture sampler2D(slidewall_next_texture, slidewall_next_sampler)
";

const VERTEX_BODY: &str = r"
layout(location = 0) in vec3 aVertexPosition;
layout(location = 1) in vec2 aTextureCoord;

layout(location = 0) out vec2 vTextureCoord;
layout(location = 1) out vec2 vActiveTextureCoord;
layout(location = 2) out vec2 vNextTextureCoord;

void main() {
    gl_Position = uPMatrix * uMVMatrix * vec4(aVertexPosition, 1.0);

    vTextureCoord = aTextureCoord;
    vActiveTextureCoord = (activeTextureMatrix * vec4(aTextureCoord, 0.0, 1.0)).xy;
    vNextTextureCoord = (nextTextureMatrix * vec4(aTextureCoord, 0.0, 1.0)).xy;
}
";

const FRAGMENT_BODY: &str = r"
layout(location = 0) in vec2 vTextureCoord;
layout(location = 1) in vec2 vActiveTextureCoord;
layout(location = 2) in vec2 vNextTextureCoord;

layout(location = 0) out vec4 outColor;

void main() {
    vec4 displacementTexture = texture(displacement, vTextureCoord);

    // The active slide slides out along y as the timer grows.
    vec2 firstDisplacementCoords = vActiveTextureCoord
        + displacementTexture.r * ((cos((uTransitionTimer + 90.0) / (90.0 / 3.141592)) + 1.0) / 1.25);
    vec4 firstDistortedColor = texture(activeTexture, vec2(vActiveTextureCoord.x, firstDisplacementCoords.y));

    // The next slide settles in from the opposite direction.
    vec2 secondDisplacementCoords = vNextTextureCoord
        - displacementTexture.r * ((cos(uTransitionTimer / (90.0 / 3.141592)) + 1.0) / 1.5);
    vec4 secondDistortedColor = texture(nextTexture, vec2(vNextTextureCoord.x, secondDisplacementCoords.y));

    vec4 finalColor = mix(
        firstDistortedColor,
        secondDistortedColor,
        1.0 - ((cos(uTransitionTimer / (90.0 / 3.141592)) + 1.0) / 2.0)
    );

    outColor = vec4(finalColor.rgb * finalColor.a, finalColor.a);
}
";
