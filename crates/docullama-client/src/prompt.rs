//! Instruction templates.
//!
//! A template is a literal prefix placed before the user's text. There is
//! no substitution: placeholders such as `{swift_code}` below are sent to
//! the model verbatim.

/// Default instruction template: document Swift code with DocC comments.
pub const DEFAULT_TEMPLATE: &str = r#"Your task is to add **DocC documentation comments** to the provided Swift code.  

### **Rules**  
1. **Never modify the original code.** Do not add, remove, or change any part of the Swift code itself.  
2. **Use this DocC format exactly:**  
/// [Brief summary (3-4 words)] 
/// 
/// - Parameters: 
/// - [parameter name]: [description] 
/// - Returns: [description of the return value]

3. **Do not include `swift` or any syntax highlighting indicators.** Only add the DocC documentation as plain comments.  
4. Ensure that the **summary is short (3-4 words)** and concise.  
5. Each parameter must have a clear, descriptive explanation.  

---

### **Example Input and Output**
#### Input:
func add(_ a: Int, _ b: Int) -> Int { 
    return a + b 
}

#### Output:
/// Adds two integers 
/// 
/// - Parameters: 
/// - a: First number to add 
/// - b: Second number to add 
/// - Returns: Sum of the two numbers
func add(_ a: Int, _ b: Int) -> Int { 
    return a + b 
}


---
### DO NOT INCLUDE `swift` or ```swift```
### **Now, Document This Swift Code**  
{swift_code}"#;

/// Build the prompt text sent to the server.
pub fn apply_template(template: &str, input: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + input.len());
    prompt.push_str(template);
    prompt.push_str(input);
    prompt
}
